// Arithmetic and fee resolution
pub mod fee_resolver;
pub mod money;

// Inputs gathered from the repositories
pub mod debt;
pub mod maintenance_costs;

// Invoice construction and maintenance
pub mod invoice_assembler;
pub mod invoice_recompute;

// Entry points used by the HTTP layer
pub mod invoice_import;
pub mod invoice_settings;
pub mod invoicing;
