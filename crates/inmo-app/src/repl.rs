use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use inmo_api::{ChatBackend, HttpBackend};
use inmo_chat::{SessionController, SessionEvent};
use inmo_results::{
    GridCard, ImageFetcher, ImageState, MapLoader, MarkerId, Region, ResultView, ViewMode,
};
use inmo_types::{Listing, Role};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::config::AppConfig;
use crate::fetcher::HttpImageFetcher;
use crate::render::{print_detail, print_grid, print_help, print_message, Palette};
use crate::terminal_map::{MapCanvas, TextEngineLoader};
use crate::theme::ThemeStore;

const MAP_COLUMNS: usize = 60;
const MAP_ROWS: usize = 16;

/// Grid cards are laid out in one column of fixed-size cells
const CARD_WIDTH_PX: f64 = 320.0;
const CARD_HEIGHT_PX: f64 = 120.0;

/// Cards visible on one page of the terminal
const PAGE_CARDS: usize = 6;

/// State of the interactive client
struct Repl {
    session: SessionController,
    events: broadcast::Receiver<SessionEvent>,
    map_loader: Arc<MapLoader>,
    fetcher: Arc<dyn ImageFetcher>,
    canvas: MapCanvas,
    image_margin: f64,
    theme: &'static ThemeStore,
    view: Option<ResultView>,
    page: usize,
    focused: Option<MarkerId>,
}

impl Repl {
    fn palette(&self) -> Palette {
        Palette::new(self.theme.current())
    }

    fn new_view(&self, listings: Vec<Listing>) -> ResultView {
        let mut view = ResultView::new(
            listings,
            self.map_loader.clone(),
            self.fetcher.clone(),
            self.image_margin,
        );
        view.layout_grid(1, CARD_WIDTH_PX, CARD_HEIGHT_PX, 0.0);
        view
    }

    /// Apply every session event queued since the last call
    async fn process_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::MessageAppended(index)) => {
                    let Some(message) = self.session.message(index).await else {
                        continue;
                    };
                    self.focused = None;
                    self.page = 0;
                    self.view = if message.listings().is_empty() {
                        None
                    } else {
                        Some(self.new_view(message.listings().to_vec()))
                    };
                    if message.role == Role::Assistant {
                        print_message(&message, &self.palette());
                        if self.view.is_some() {
                            self.show_grid().await;
                        }
                    }
                }
                Ok(SessionEvent::Reset { generation }) => {
                    self.view = None;
                    self.focused = None;
                    log::debug!("Transcript cleared (generation {})", generation);
                    println!("{}", self.palette().muted("Conversacion reiniciada."));
                }
                Ok(SessionEvent::PendingChanged(_)) | Ok(SessionEvent::FocusComposer) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Missed {} session events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn no_results(&self) {
        println!(
            "{}",
            self.palette().muted("No hay resultados para mostrar. Contame que estas buscando.")
        );
    }

    async fn show_grid(&mut self) {
        let palette = self.palette();
        let page = self.page;
        let Some(view) = self.view.as_mut() else {
            self.no_results();
            return;
        };
        view.set_mode(ViewMode::Grid);

        let top = (page * PAGE_CARDS) as f64 * CARD_HEIGHT_PX;
        view.scroll_to(Region::new(0.0, top, CARD_WIDTH_PX, PAGE_CARDS as f64 * CARD_HEIGHT_PX));
        view.load_visible_images().await;

        let total = view.listings().len();
        let cards: Vec<(GridCard, Option<ImageState>)> = view
            .grid_cards()
            .into_iter()
            .skip(page * PAGE_CARDS)
            .take(PAGE_CARDS)
            .map(|card| {
                let state = view.images().state(&card.listing_id);
                (card, state)
            })
            .collect();
        print_grid(&cards, &palette).await;

        let shown = ((page + 1) * PAGE_CARDS).min(total);
        if shown < total {
            println!(
                "{}",
                palette.muted(&format!("  {} de {} · /mas para ver mas", shown, total))
            );
        }
    }

    async fn next_page(&mut self) {
        let total = self.view.as_ref().map(|v| v.listings().len()).unwrap_or(0);
        if (self.page + 1) * PAGE_CARDS >= total {
            println!("{}", self.palette().muted("No hay mas resultados."));
            return;
        }
        self.page += 1;
        self.show_grid().await;
    }

    fn print_map(&self) {
        let palette = self.palette();
        let Some(view) = self.view.as_ref() else {
            return;
        };
        if let Some(frame) = self.canvas.frame() {
            println!("{}", frame);
        }
        println!("{}", palette.muted(&view.map().badge_label()).bold());
    }

    async fn show_map(&mut self) {
        let palette = self.palette();
        let Some(view) = self.view.as_mut() else {
            self.no_results();
            return;
        };
        if !view.set_mode(ViewMode::Map) {
            println!(
                "{}",
                palette.muted("Ninguno de estos inmuebles tiene ubicacion para el mapa.")
            );
            return;
        }
        if let Err(e) = view.render_map().await {
            log::warn!("Map unavailable: {}", e);
            view.set_mode(ViewMode::Grid);
            println!("{}", palette.error("No se pudo cargar el mapa."));
            return;
        }
        self.print_map();
    }

    fn unfocus(&mut self) {
        if let (Some(marker), Some(view)) = (self.focused.take(), self.view.as_mut()) {
            view.hover_marker(marker, false);
        }
    }

    fn select(&mut self, target: &str) {
        let palette = self.palette();
        self.unfocus();
        let Some(view) = self.view.as_mut() else {
            self.no_results();
            return;
        };

        if let Some(number) = target.strip_prefix('#') {
            if view.mode() != ViewMode::Map {
                println!("{}", palette.muted("Los marcadores se eligen desde /map."));
                return;
            }
            let Ok(number) = number.parse::<usize>() else {
                println!("{}", palette.error(&format!("Marcador invalido: {}", target)));
                return;
            };
            let marker = MarkerId(number);
            view.hover_marker(marker, true);
            if !view.click_marker(marker) {
                view.hover_marker(marker, false);
                println!("{}", palette.error(&format!("No existe el marcador {}", number)));
                return;
            }
            self.focused = Some(marker);
        } else if !view.select(Some(target)) {
            println!("{}", palette.error(&format!("No encontre el inmueble {}", target)));
            return;
        }
        self.show_detail();
    }

    fn show_detail(&self) {
        let palette = self.palette();
        let Some(view) = self.view.as_ref() else {
            return;
        };
        match view.detail() {
            Some(detail) => print_detail(&detail, view.carousel(), &palette),
            None => println!("{}", palette.muted("Abri un inmueble con /ver <id>.")),
        }
    }

    fn close_detail(&mut self) {
        self.unfocus();
        if let Some(view) = self.view.as_mut() {
            view.select(None);
            if view.mode() == ViewMode::Map {
                self.print_map();
            }
        }
    }

    fn step_carousel(&mut self, forward: bool) {
        match self.view.as_mut().and_then(ResultView::carousel_mut) {
            Some(carousel) => {
                if forward {
                    carousel.next();
                } else {
                    carousel.prev();
                }
                self.show_detail();
            }
            None => println!("{}", self.palette().muted("Abri un inmueble con /ver <id>.")),
        }
    }

    fn toggle_theme(&self) {
        match self.theme.toggle() {
            Ok(theme) => println!("{}", self.palette().assistant(&format!("Tema: {}", theme.as_str()))),
            Err(e) => eprintln!("{} {:#}", "No se pudo guardar el tema:".bright_red(), e),
        }
    }

    async fn send(&mut self, text: &str) {
        println!("{}", self.palette().muted("INMO esta escribiendo..."));
        if !self.session.send(text).await {
            println!("{}", self.palette().muted("Espera la respuesta anterior."));
        }
        self.process_events().await;
    }

    /// Handle one input line; returns `false` to leave the REPL
    async fn handle(&mut self, line: &str) -> bool {
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "exit" | "quit" => return false,
            "/ayuda" | "/help" => print_help(&self.palette()),
            "/reset" => {
                self.session.reset().await;
                self.process_events().await;
            }
            "/grid" => self.show_grid().await,
            "/mas" => self.next_page().await,
            "/map" => self.show_map().await,
            "/ver" if !arg.is_empty() => self.select(arg),
            "/ver" => println!("{}", self.palette().muted("Uso: /ver <id> o /ver #<marcador>")),
            "/cerrar" => self.close_detail(),
            "/sig" => self.step_carousel(true),
            "/ant" => self.step_carousel(false),
            "/tema" => self.toggle_theme(),
            _ if command.starts_with('/') => {
                println!(
                    "{}",
                    self.palette()
                        .error(&format!("Comando desconocido: {} (proba /ayuda)", command))
                );
            }
            _ => self.send(line).await,
        }
        true
    }
}

/// Run interactive REPL mode
pub async fn run_repl_mode(config: AppConfig, theme: &'static ThemeStore) -> Result<()> {
    let backend: Arc<dyn ChatBackend> = Arc::new(match config.timeout {
        Some(timeout) => HttpBackend::with_timeout(&config.base_url, timeout)?,
        None => HttpBackend::new(&config.base_url),
    });
    let canvas = MapCanvas::new();
    let map_loader = MapLoader::new(Arc::new(TextEngineLoader::new(
        canvas.clone(),
        MAP_COLUMNS,
        MAP_ROWS,
    )));
    let fetcher: Arc<dyn ImageFetcher> = Arc::new(HttpImageFetcher::new(config.timeout)?);

    let session = SessionController::new(backend);
    let events = session.subscribe();

    let mut repl = Repl {
        session,
        events,
        map_loader,
        fetcher,
        canvas,
        image_margin: config.image_margin,
        theme,
        view: None,
        page: 0,
        focused: None,
    };

    let palette = repl.palette();
    println!("{}", palette.assistant("🏠 INMO - Asistente inmobiliario").bold());
    println!("{}", palette.muted(&format!("Backend: {}", config.base_url)));
    println!("{}", palette.muted("Escribi 'exit' para salir o '/ayuda' para ver los comandos\n"));

    repl.session.start().await;
    repl.process_events().await;

    let mut rl = DefaultEditor::new()?;

    loop {
        let prompt = format!("{} ", repl.palette().user("Vos:"));
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if !repl.handle(line).await {
                    println!("{}", repl.palette().assistant("¡Hasta luego!"));
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".bright_yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {}", "Error:".bright_red(), e);
                break;
            }
        }
    }

    Ok(())
}
