//! Terminal rendering of the transcript and result views

use colored::{ColoredString, Colorize};
use inmo_results::view::STAGGER_STEP;
use inmo_results::{Carousel, DetailView, GridCard, ImageState, OperationBadge};
use inmo_types::{Message, Operation, Role};

use crate::theme::Theme;

/// Colors for one theme
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    theme: Theme,
}

impl Palette {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn user(&self, text: &str) -> ColoredString {
        match self.theme {
            Theme::Light => text.green().bold(),
            Theme::Dark => text.bright_green().bold(),
        }
    }

    pub fn assistant(&self, text: &str) -> ColoredString {
        match self.theme {
            Theme::Light => text.blue(),
            Theme::Dark => text.bright_cyan(),
        }
    }

    pub fn muted(&self, text: &str) -> ColoredString {
        match self.theme {
            Theme::Light => text.black().dimmed(),
            Theme::Dark => text.bright_black(),
        }
    }

    pub fn badge(&self, badge: &OperationBadge) -> ColoredString {
        match badge.operation {
            Operation::Sale => badge.label.green().bold(),
            Operation::Rental => badge.label.yellow().bold(),
        }
    }

    pub fn featured(&self) -> ColoredString {
        "★ Destacado".bright_yellow()
    }

    pub fn error(&self, text: &str) -> ColoredString {
        text.bright_red()
    }
}

pub fn print_message(message: &Message, palette: &Palette) {
    match message.role {
        Role::User => println!("{} {}", palette.user("Vos:"), message.text),
        Role::Assistant => {
            println!("{} {}", palette.assistant("INMO:").bold(), palette.assistant(&message.text));
            let count = message.listings().len();
            if count > 0 {
                println!(
                    "{}",
                    palette.muted(&format!(
                        "  {} {} encontrados · /grid, /map, /ver <id>",
                        count,
                        inmo_results::pluralize(count as i64, "inmueble", "inmuebles")
                    ))
                );
            }
        }
    }
}

/// Plain text of one grid card
pub fn grid_line(card: &GridCard, image: Option<ImageState>) -> String {
    let image = match image {
        Some(ImageState::Loaded) => "foto",
        Some(ImageState::InView) => "cargando foto",
        Some(ImageState::Errored) | None => "sin imagen",
        Some(ImageState::Unobserved) => "...",
    };
    format!(
        "[{}] {} · {} · {}",
        card.listing_id, card.title, card.price_label, image
    )
}

/// Print cards with their entrance stagger applied
pub async fn print_grid(cards: &[(GridCard, Option<ImageState>)], palette: &Palette) {
    for (card, image) in cards {
        if !card.entrance_delay.is_zero() {
            tokio::time::sleep(STAGGER_STEP).await;
        }
        let featured = if card.featured {
            format!(" {}", palette.featured())
        } else {
            String::new()
        };
        println!("  {} {}{}", palette.badge(&card.badge), grid_line(card, *image), featured);
    }
}

/// Plain lines of the detail view
pub fn detail_lines(detail: &DetailView, carousel: Option<&Carousel>) -> Vec<String> {
    let mut lines = vec![
        detail.title.clone(),
        format!("{} · {}", detail.price_label, detail.badge.label),
        format!("ID: {}", detail.listing_id),
    ];
    if !detail.location.is_empty() {
        lines.push(detail.location.clone());
    }
    if !detail.tiles.is_empty() {
        lines.push(
            detail
                .tiles
                .iter()
                .map(|t| format!("{} {}", t.value, t.label))
                .collect::<Vec<_>>()
                .join(" | "),
        );
    }
    if let Some(carousel) = carousel {
        match carousel.current() {
            Some(src) => lines.push(format!("Foto {}: {}", carousel.counter(), src)),
            None => lines.push(carousel.counter()),
        }
    }
    lines
}

pub fn print_detail(detail: &DetailView, carousel: Option<&Carousel>, palette: &Palette) {
    let lines = detail_lines(detail, carousel);
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    println!("{}", palette.muted(&format!("┌{}┐", "─".repeat(width + 2))));
    for (i, line) in lines.iter().enumerate() {
        let text = if i == 0 {
            line.bold()
        } else {
            line.normal()
        };
        println!("  {}", text);
    }
    if detail.featured {
        println!("  {}", palette.featured());
    }
    println!("{}", palette.muted(&format!("└{}┘", "─".repeat(width + 2))));
    println!("{}", palette.muted("/sig, /ant para las fotos · /cerrar para volver"));
}

pub fn print_help(palette: &Palette) {
    println!("{}", palette.assistant("Comandos:"));
    println!("  /grid          - Ver los resultados como lista");
    println!("  /map           - Ver los resultados en el mapa");
    println!("  /mas           - Mostrar la siguiente pagina de la lista");
    println!("  /ver <id>      - Ver el detalle de un inmueble (#n para un marcador)");
    println!("  /cerrar        - Cerrar el detalle");
    println!("  /sig, /ant     - Foto siguiente / anterior");
    println!("  /reset         - Empezar una conversacion nueva");
    println!("  /tema          - Cambiar entre tema claro y oscuro");
    println!("  /ayuda         - Mostrar esta ayuda");
    println!("  exit           - Salir");
}
