mod browser;
mod catalog;
mod config;
mod favorites;
mod filter;
mod model;
mod prefs;
mod state;
mod ui;

use anyhow::Result;
use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use calloop_wayland_source::WaylandSource;
use clap::Parser;
use smithay_client_toolkit::{
    shell::wlr_layer::{Anchor, KeyboardInteractivity, Layer},
    shell::WaylandSurface,
};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use wayland_client::{globals::registry_queue_init, Connection};

use crate::config::load_config;
use crate::state::AppState;
use crate::ui::blossoms::BlossomField;
use crate::ui::icons::IconCache;
use crate::ui::render::Renderer;
use crate::ui::wayland::WaylandApp;

const BLOSSOM_TICK: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Catalog document to browse (overrides the configured path)
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Category slug to start on
    #[arg(long)]
    category: Option<String>,

    /// Start with the blossom effect disabled
    #[arg(long)]
    no_blossoms: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // 1. Load Config
    let config = load_config()?;

    // 2. Setup Wayland Connection & Event Loop
    let mut event_loop: EventLoop<WaylandApp> = EventLoop::try_new()?;
    let conn = Connection::connect_to_env()?;
    let (globals, event_queue) = registry_queue_init::<WaylandApp>(&conn).unwrap();
    let qh = event_queue.handle();

    // 3. Init State & UI
    let (tx_icons, rx_icons) = calloop::channel::channel::<(String, Option<tiny_skia::Pixmap>)>();
    let icon_cache = IconCache::new(tx_icons);
    let renderer = Renderer::new(icon_cache);

    let mut app_state = AppState::new(config.clone());
    if let Some(slug) = &args.category {
        // Checked again once the catalog is in; unknown slugs revert to all.
        app_state.filter.category = slug.clone();
    }

    let blossoms = BlossomField::new(
        config.blossoms.enabled && !args.no_blossoms,
        config.blossoms.count,
    );

    let mut app = WaylandApp::new(&conn, &globals, &qh, app_state, renderer, blossoms);

    // 4. Create Layer Surface
    let surface = app.compositor_state.create_surface(&qh);
    let layer_surface = app.layer_shell_state.create_layer_surface(
        &qh,
        surface,
        Layer::Top,
        Some("hanami"),
        None,
    );

    layer_surface.set_anchor(Anchor::empty());
    layer_surface.set_size(config.theme.width, config.theme.height);
    layer_surface.set_keyboard_interactivity(KeyboardInteractivity::OnDemand);
    layer_surface.commit();
    app.layer_surface = Some(layer_surface);

    // 5. One-shot catalog load off the main thread
    let (tx_catalog, rx_catalog) = calloop::channel::channel();
    let catalog_path = catalog::resolve_path(args.catalog.clone(), &config);
    thread::spawn(move || {
        let _ = tx_catalog.send(catalog::load(&catalog_path));
    });

    let conn_clone = conn.clone();
    let qh_clone = qh.clone();

    // Icon update handler
    let conn_c1 = conn_clone.clone();
    let qh_c1 = qh_clone.clone();
    event_loop.handle().insert_source(rx_icons, move |event, _, app: &mut WaylandApp| {
        if let calloop::channel::Event::Msg((icon, pixmap)) = event {
            app.renderer.insert_icon(icon, pixmap);
            app.draw(&conn_c1, &qh_c1);
        }
    }).unwrap();

    // Catalog result handler: populates exactly once, or flips the view to
    // its permanent error state.
    let conn_c2 = conn_clone.clone();
    let qh_c2 = qh_clone.clone();
    event_loop.handle().insert_source(rx_catalog, move |event, _, app: &mut WaylandApp| {
        if let calloop::channel::Event::Msg(result) = event {
            match result {
                Ok(entries) => app.state.set_entries(entries),
                Err(err) => {
                    log::error!("catalog load failed: {err}");
                    app.state.set_load_error(&err);
                }
            }
            app.draw(&conn_c2, &qh_c2);
        }
    }).unwrap();

    // Blossom spawn timer, unrelated to the data core.
    let conn_c3 = conn_clone.clone();
    let qh_c3 = qh_clone.clone();
    event_loop.handle().insert_source(
        Timer::from_duration(BLOSSOM_TICK),
        move |_deadline, _, app: &mut WaylandApp| {
            app.blossoms.top_up();
            app.draw(&conn_c3, &qh_c3);
            TimeoutAction::ToDuration(BLOSSOM_TICK)
        },
    ).unwrap();

    event_loop.handle().insert_source(
        WaylandSource::new(conn.clone(), event_queue),
        |_, queue, app| {
            queue.dispatch_pending(app)
        }
    ).unwrap();

    // 6. Run Loop
    loop {
        if app.should_exit {
            break;
        }
        event_loop.dispatch(None, &mut app)?;
    }

    Ok(())
}
