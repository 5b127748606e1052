use hostlink::exec::ShellExecutor;
use hostlink::payload::DesktopPayloads;
use hostlink::store::TomlStore;
use relm4::prelude::*;
use rondel::config;
use rondel::gui::app::AppModel;
use rondel::sys::runtime;
use rondel_core::ports::MemoryStore;
use rondel_core::{CommandStore, MenuContext, MenuCoordinator, SectorTheme};

fn open_store() -> Box<dyn CommandStore> {
    match TomlStore::open_default() {
        Ok(store) => {
            log::info!("Loaded {} commands from {:?}", store.len(), store.root());
            Box::new(store)
        }
        Err(e) => {
            log::error!("Commands will not be saved: {}", e);
            Box::new(MemoryStore::default())
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    if let Err(e) = config::write_default_config() {
        log::warn!("Could not write default config: {}", e);
    }
    let config = config::load_or_default();

    let ctx = MenuContext::new(
        open_store(),
        Box::new(ShellExecutor::default()),
        Box::new(DesktopPayloads),
    );
    let menu = MenuCoordinator::new(config.checked_layout(SectorTheme::default()), ctx)?;

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx);

    let app = RelmApp::new("org.rondel.rondel");

    app.run::<AppModel>((menu, config, rx));
    Ok(())
}
