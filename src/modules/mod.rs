pub mod books;

use folio_kernel::settings::Settings;
use folio_kernel::ModuleRegistry;

/// Register all application modules with the registry.
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) {
    registry.register(books::create_module(settings));
}
