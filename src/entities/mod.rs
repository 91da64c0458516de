//! SeaORM entities for the leasing domain.

pub mod invoice;
pub mod lease;
pub mod maintenance;
pub mod room;
pub mod tenant;
