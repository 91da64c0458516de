pub mod health;
pub mod imports;
pub mod invoices;
pub mod settings;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::repositories::Repositories;
use crate::services::invoice_import::InvoiceImportService;
use crate::services::invoice_settings::InvoiceSettingsStore;
use crate::services::invoicing::InvoicingService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub invoicing: Arc<InvoicingService>,
    pub imports: Arc<InvoiceImportService>,
    pub settings: Arc<InvoiceSettingsStore>,
}

impl AppServices {
    /// Wires every service on top of one set of repositories.
    pub fn new(repos: Repositories, config: &AppConfig) -> Self {
        let settings = Arc::new(InvoiceSettingsStore::new(config.billing.clone()));
        let invoicing = InvoicingService::new(repos, settings.clone());
        let imports = InvoiceImportService::new(&invoicing, config.max_import_bytes);

        Self {
            invoicing: Arc::new(invoicing),
            imports: Arc::new(imports),
            settings,
        }
    }
}
