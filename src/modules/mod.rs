pub mod books;

use bookshelf_db::StatementExecutor;
use bookshelf_kernel::ModuleRegistry;
use std::sync::Arc;

/// Register all feature modules, handing them the shared executor
pub fn register_all(registry: &mut ModuleRegistry, executor: Arc<dyn StatementExecutor>) {
    registry.register_custom(books::create_module(books::BookStore::new(executor)));
}
