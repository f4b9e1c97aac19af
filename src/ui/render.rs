use crate::config::{Palette, ThemeConfig};
use crate::state::{AppState, CatalogPhase};
use crate::ui::blossoms::BlossomField;
use crate::ui::icons::IconCache;
use cosmic_text::{Attrs, Buffer, FontSystem, Metrics, SwashCache};
use std::time::Instant;
use tiny_skia::{
    Color, Paint, PathBuilder, PixmapMut, PixmapPaint, Rect, Stroke, Transform,
};

const DESC_MAX_CHARS: usize = 150;
const ICON_SIZE: u32 = 24;

pub struct Renderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    pub icon_cache: IconCache,
}

impl Renderer {
    pub fn new(icon_cache: IconCache) -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            icon_cache,
        }
    }

    pub fn insert_icon(&mut self, icon: String, pixmap: Option<tiny_skia::Pixmap>) {
        self.icon_cache.insert(icon, pixmap);
    }

    pub fn draw(&mut self, pixmap: &mut PixmapMut, state: &AppState, blossoms: &BlossomField) {
        let theme = &state.config.theme;
        let palette = theme.palette(state.night_mode).clone();
        let bg = ThemeConfig::parse_color(&palette.background);
        let border = ThemeConfig::parse_color(&palette.border);
        let text = ThemeConfig::parse_color(&palette.text);
        let muted = ThemeConfig::parse_color(&palette.muted);
        let accent = ThemeConfig::parse_color(&palette.accent);
        let card_bg = ThemeConfig::parse_color(&palette.card);
        let sel_text = ThemeConfig::parse_color(&palette.selection_text);

        pixmap.fill(Color::TRANSPARENT);

        let width = pixmap.width() as f32;
        let height = pixmap.height() as f32;
        let pad = theme.padding;

        let rect = Rect::from_xywh(0.0, 0.0, width, height).unwrap();
        self.draw_rounded_rect(pixmap, rect, theme.border_radius, bg, Some(border));

        // Header: title left, counts and mode label right.
        let header_y = pad;
        self.draw_text(pixmap, "Hanami", pad, header_y, 22.0, accent);
        let mode_label = if state.night_mode { "Night Mode" } else { "Day Mode" };
        let counts = format!(
            "{} total · {} showing · {} favorites · {}",
            state.total_count(),
            state.showing_count(),
            state.favorites_count(),
            mode_label
        );
        let counts_x = (width - pad - approx_text_width(&counts, 13.0)).max(pad);
        self.draw_text(pixmap, &counts, counts_x, header_y + 6.0, 13.0, muted);

        // Search bar.
        let search_y = header_y + 30.0 + theme.spacing;
        let search_h = 32.0;
        if let Some(bar) = Rect::from_xywh(pad, search_y, width - 2.0 * pad, search_h) {
            self.draw_rounded_rect(pixmap, bar, theme.border_radius / 2.0, card_bg, Some(border));
        }
        let (search_text, search_color) = if state.filter.search.is_empty() {
            ("Search websites...".to_string(), muted)
        } else {
            (format!("> {}", state.filter.search), text)
        };
        self.draw_text(pixmap, &search_text, pad + 10.0, search_y + 7.0, 16.0, search_color);

        // Category buttons, mutually exclusive.
        let cat_y = search_y + search_h + theme.spacing;
        let cat_h = 26.0;
        let mut x = pad;
        for category in &state.categories {
            let selected = category.slug == state.filter.category;
            let label_w = approx_text_width(&category.label, 13.0);
            let btn_w = label_w + 20.0;
            if x + btn_w > width - pad {
                break;
            }
            if let Some(btn) = Rect::from_xywh(x, cat_y, btn_w, cat_h) {
                let (fill, label_color) = if selected {
                    (accent, sel_text)
                } else {
                    (card_bg, muted)
                };
                self.draw_rounded_rect(pixmap, btn, cat_h / 2.0, fill, Some(border));
                self.draw_text(pixmap, &category.label, x + 10.0, cat_y + 5.0, 13.0, label_color);
            }
            x += btn_w + theme.spacing;
        }

        // Card list.
        let list_y = cat_y + cat_h + theme.spacing;
        let footer_h = 24.0;
        let list_h = height - list_y - pad - footer_h;
        let card_stride = theme.card_height + theme.spacing;
        let visible_cards = (list_h / card_stride).max(0.0) as usize;

        match &state.phase {
            CatalogPhase::Loading => {
                self.draw_text(pixmap, "Loading catalog...", pad, list_y + 10.0, 16.0, muted);
            }
            CatalogPhase::Failed(msg) => {
                self.draw_text(
                    pixmap,
                    "Could not load the catalog",
                    pad,
                    list_y + 10.0,
                    18.0,
                    accent,
                );
                self.draw_text(pixmap, msg, pad, list_y + 38.0, 13.0, muted);
            }
            CatalogPhase::Ready if state.filtered_indices.is_empty() => {
                self.draw_text(pixmap, "No results found", pad, list_y + 10.0, 18.0, text);
                self.draw_text(
                    pixmap,
                    "Try a different search or category",
                    pad,
                    list_y + 38.0,
                    13.0,
                    muted,
                );
            }
            CatalogPhase::Ready => {
                let scroll = scroll_offset(
                    state.filtered_indices.len(),
                    visible_cards,
                    state.selected_index,
                );
                for (i, &entry_idx) in state
                    .filtered_indices
                    .iter()
                    .enumerate()
                    .skip(scroll)
                    .take(visible_cards)
                {
                    let y = list_y + ((i - scroll) as f32) * card_stride;
                    let selected = i == state.selected_index;
                    self.draw_card(
                        pixmap, state, entry_idx, y, width, selected, &palette, theme,
                    );
                }
            }
        }

        // Footer hints and effect status.
        let hints = "↑↓ select · ←→ category · ⏎ open · ^S fav · ^F favs only · ^T theme · ^B petals · ^+/- count";
        self.draw_text(pixmap, hints, pad, height - pad - 14.0, 12.0, muted);
        let petal_status = if blossoms.active() {
            format!("❀ {}", blossoms.count())
        } else {
            "❀ off".to_string()
        };
        let status_x = (width - pad - approx_text_width(&petal_status, 12.0)).max(pad);
        self.draw_text(pixmap, &petal_status, status_x, height - pad - 14.0, 12.0, muted);

        // Petals float above everything; they carry no information.
        let petal_color = ThemeConfig::parse_color(&palette.petal);
        for p in blossoms.positions(Instant::now(), width, height) {
            let mut color = if p.white { Color::WHITE } else { petal_color };
            color.apply_opacity(p.opacity);
            self.draw_circle(pixmap, p.x, p.y, p.radius, color);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_card(
        &mut self,
        pixmap: &mut PixmapMut,
        state: &AppState,
        entry_idx: usize,
        y: f32,
        width: f32,
        selected: bool,
        palette: &Palette,
        theme: &ThemeConfig,
    ) {
        let entry = &state.entries[entry_idx];
        let pad = theme.padding;
        let text = ThemeConfig::parse_color(&palette.text);
        let muted = ThemeConfig::parse_color(&palette.muted);
        let accent = ThemeConfig::parse_color(&palette.accent);
        let card_bg = ThemeConfig::parse_color(&palette.card);
        let sel_bg = ThemeConfig::parse_color(&palette.selection_background);
        let border = ThemeConfig::parse_color(&palette.border);

        let card_w = width - 2.0 * pad;
        let Some(card) = Rect::from_xywh(pad, y, card_w, theme.card_height) else {
            return;
        };
        let fill = if selected { sel_bg } else { card_bg };
        let stroke = if selected { accent } else { border };
        self.draw_rounded_rect(pixmap, card, theme.border_radius / 2.0, fill, Some(stroke));

        let inner_x = pad + 12.0;
        let mut name_x = inner_x;

        // Icon: image paths go through the cache, anything else is a glyph.
        if entry.icon_is_image() {
            if let Some(icon) = self.icon_cache.get(&entry.icon, ICON_SIZE) {
                let paint = PixmapPaint::default();
                pixmap.draw_pixmap(
                    name_x as i32,
                    (y + 10.0) as i32,
                    icon.as_ref(),
                    &paint,
                    Transform::identity(),
                    None,
                );
                name_x += ICON_SIZE as f32 + 8.0;
            }
        } else if !entry.icon.is_empty() {
            self.draw_text(pixmap, &entry.icon, name_x, y + 10.0, 16.0, text);
            name_x += 26.0;
        }

        let name_color = if selected {
            ThemeConfig::parse_color(&palette.selection_text)
        } else {
            text
        };
        self.draw_text(pixmap, &entry.name, name_x, y + 10.0, 16.0, name_color);
        if state.favorites.contains(entry.id) {
            let heart_x = name_x + approx_text_width(&entry.name, 16.0) + 8.0;
            self.draw_text(pixmap, "♥", heart_x, y + 10.0, 14.0, accent);
        }

        // Category badge, right aligned.
        let badge_w = approx_text_width(&entry.category_name, 11.0) + 14.0;
        let badge_x = pad + card_w - badge_w - 10.0;
        if let Some(badge) = Rect::from_xywh(badge_x, y + 10.0, badge_w, 18.0) {
            self.draw_rounded_rect(pixmap, badge, 9.0, sel_bg, None);
            self.draw_text(
                pixmap,
                &entry.category_name,
                badge_x + 7.0,
                y + 12.0,
                11.0,
                muted,
            );
        }

        // One line of description, truncated like the original's cards.
        let desc = truncate_description(&entry.description, DESC_MAX_CHARS);
        let line_chars = ((card_w - 24.0) / (13.0 * 0.55)) as usize;
        let desc = truncate_description(&desc, line_chars.max(8));
        self.draw_text(pixmap, &desc, inner_x, y + 38.0, 13.0, muted);

        // Tags left, url host right.
        if !entry.tags.is_empty() {
            let tags = entry
                .tags
                .iter()
                .map(|t| format!("#{t}"))
                .collect::<Vec<_>>()
                .join("  ");
            self.draw_text(pixmap, &tags, inner_x, y + 62.0, 12.0, accent);
        }
        let host = entry.url_host().to_string();
        let host_x = (pad + card_w - approx_text_width(&host, 12.0) - 12.0).max(inner_x);
        self.draw_text(pixmap, &host, host_x, y + 62.0, 12.0, muted);
    }

    fn draw_circle(&self, pixmap: &mut PixmapMut, x: f32, y: f32, radius: f32, color: Color) {
        let mut pb = PathBuilder::new();
        pb.push_circle(x, y, radius);
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(color);
            paint.anti_alias = true;
            pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, Transform::identity(), None);
        }
    }

    fn draw_rounded_rect(
        &self,
        pixmap: &mut PixmapMut,
        rect: Rect,
        radius: f32,
        fill: Color,
        stroke: Option<Color>,
    ) {
        let mut pb = PathBuilder::new();
        let x = rect.left();
        let y = rect.top();
        let w = rect.width();
        let h = rect.height();

        pb.move_to(x + radius, y);
        pb.line_to(x + w - radius, y);
        pb.quad_to(x + w, y, x + w, y + radius);
        pb.line_to(x + w, y + h - radius);
        pb.quad_to(x + w, y + h, x + w - radius, y + h);
        pb.line_to(x + radius, y + h);
        pb.quad_to(x, y + h, x, y + h - radius);
        pb.line_to(x, y + radius);
        pb.quad_to(x, y, x + radius, y);
        pb.close();

        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color(fill);
            paint.anti_alias = true;
            pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, Transform::identity(), None);

            if let Some(s_color) = stroke {
                let mut s_paint = Paint::default();
                s_paint.set_color(s_color);
                s_paint.anti_alias = true;
                let stroke_obj = Stroke { width: 1.5, ..Default::default() };
                pixmap.stroke_path(&path, &s_paint, &stroke_obj, Transform::identity(), None);
            }
        }
    }

    fn draw_text(&mut self, pixmap: &mut PixmapMut, text: &str, x: f32, y: f32, size: f32, color: Color) {
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size));
        buffer.set_size(&mut self.font_system, Some(pixmap.width() as f32 - x), None);
        buffer.set_text(&mut self.font_system, text, Attrs::new(), cosmic_text::Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let text_color = cosmic_text::Color::rgba(
            (color.red() * 255.0) as u8,
            (color.green() * 255.0) as u8,
            (color.blue() * 255.0) as u8,
            (color.alpha() * 255.0) as u8,
        );

        buffer.draw(&mut self.font_system, &mut self.swash_cache, text_color, |draw_x, draw_y, w, h, color| {
            let draw_x = draw_x + x as i32;
            let draw_y = draw_y + y as i32;
            if w == 0 || h == 0 { return; }
            if draw_x >= 0 && draw_y >= 0 && draw_x < pixmap.width() as i32 && draw_y < pixmap.height() as i32 {
                 let paint = Paint {
                    shader: tiny_skia::Shader::SolidColor(tiny_skia::Color::from_rgba8(color.r(), color.g(), color.b(), color.a())),
                    ..Paint::default()
                };
                let rect = Rect::from_xywh(draw_x as f32, draw_y as f32, w as f32, h as f32);
                if let Some(r) = rect {
                    pixmap.fill_rect(r, &paint, Transform::identity(), None);
                }
            }
        });
    }
}

/// Centers the selection in the visible window, pinned at the list ends.
fn scroll_offset(total: usize, visible: usize, selected: usize) -> usize {
    if total <= visible || visible == 0 {
        0
    } else if selected < visible / 2 {
        0
    } else if selected >= total - visible / 2 {
        total.saturating_sub(visible)
    } else {
        selected - visible / 2
    }
}

fn truncate_description(desc: &str, max_chars: usize) -> String {
    if desc.chars().count() <= max_chars {
        return desc.to_string();
    }
    let cut: String = desc.chars().take(max_chars).collect();
    format!("{cut}...")
}

/// Rough advance width, used only to right-align and size buttons. Cheaper
/// than shaping the text twice.
fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.55
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truncation_keeps_short_descriptions_intact() {
        assert_eq!(truncate_description("short", 150), "short");
    }

    #[test]
    fn truncation_cuts_on_char_boundaries() {
        let long = "å".repeat(200);
        let got = truncate_description(&long, 150);
        assert_eq!(got.chars().count(), 153); // 150 + "..."
        assert!(got.ends_with("..."));
    }

    #[test]
    fn scroll_pins_to_the_ends() {
        assert_eq!(scroll_offset(3, 10, 2), 0);
        assert_eq!(scroll_offset(20, 6, 0), 0);
        assert_eq!(scroll_offset(20, 6, 19), 14);
        assert_eq!(scroll_offset(20, 6, 10), 7);
    }
}
