/// View-side tile state and the widgets built from it
///
/// `TileBoard` mirrors the controller's positions one-to-one. It only
/// changes in response to `ViewCommand`s and accepted render completions.

use std::collections::HashMap;

use iced::widget::{button, container, image, mouse_area, row, text};
use iced::{Alignment, Border, Color, ContentFit, Element, Length, Theme};

use crate::state::data::{ImageId, ImageRecord};
use crate::ui::grid::{ActionSurface, RenderCompletion, RenderOutcome, TileStyle};
use crate::Message;

/// Border colour of the selected tile
const SELECTED_BORDER: Color = Color::from_rgb(0.25, 0.55, 1.0);

/// What a tile currently shows
#[derive(Debug, Clone)]
pub enum TileImage {
    Pending,
    Ready(image::Handle),
    Failed,
}

/// One grid position as the view sees it
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: ImageId,
    /// Height at the configured tile width, from the image's aspect ratio
    pub height: f32,
    pub image: TileImage,
    pub style: TileStyle,
}

#[derive(Debug, Default)]
pub struct TileBoard {
    tiles: Vec<Tile>,
    /// Thumbnails by identity, so rebinding a moved record skips the decode
    cache: HashMap<ImageId, image::Handle>,
}

impl TileBoard {
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Positions from `start` are about to be rebound in order
    pub fn resize(&mut self, start: usize, new_len: usize) {
        self.tiles.truncate(start);
        self.tiles.reserve(new_len.saturating_sub(start));
    }

    /// Bind `record` at `position`. Returns true when a cached thumbnail was used.
    pub fn bind(&mut self, position: usize, record: &ImageRecord, tile_width: f32) -> bool {
        let cached = self.cache.get(&record.id).cloned();
        let reused = cached.is_some();
        let tile = Tile {
            id: record.id.clone(),
            height: record.tile_height(tile_width),
            image: cached.map_or(TileImage::Pending, TileImage::Ready),
            style: TileStyle::Normal,
        };

        match position.cmp(&self.tiles.len()) {
            std::cmp::Ordering::Less => self.tiles[position] = tile,
            std::cmp::Ordering::Equal => self.tiles.push(tile),
            std::cmp::Ordering::Greater => {
                log::warn!(
                    "⚠️  Bind at {} skips positions (board has {})",
                    position,
                    self.tiles.len()
                );
                return false;
            }
        }
        reused
    }

    pub fn set_style(&mut self, position: usize, style: TileStyle) {
        if let Some(tile) = self.tiles.get_mut(position) {
            tile.style = style;
        }
    }

    /// Store the result of an accepted render
    pub fn finish(&mut self, completion: RenderCompletion) {
        let image = match completion.outcome {
            RenderOutcome::Rendered(thumb) => {
                let handle = image::Handle::from_rgba(thumb.width, thumb.height, thumb.rgba);
                self.cache.insert(completion.id.clone(), handle.clone());
                TileImage::Ready(handle)
            }
            RenderOutcome::Reused => return,
            RenderOutcome::Failed(_) => TileImage::Failed,
        };

        if let Some(tile) = self.tiles.get_mut(completion.position) {
            if tile.id == completion.id {
                tile.image = image;
            }
        }
    }

    /// Drop cached thumbnails of records no longer in `live`
    pub fn prune(&mut self, live: &[ImageRecord]) {
        self.cache
            .retain(|id, _| live.iter().any(|record| &record.id == id));
    }
}

/// A tile: click opens the full view, right click stands in for a long press
pub fn tile_view(position: usize, tile: &Tile, width: f32) -> Element<'_, Message> {
    let content: Element<Message> = match &tile.image {
        TileImage::Ready(handle) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .content_fit(ContentFit::Cover)
            .into(),
        TileImage::Pending => text("…").size(16).into(),
        TileImage::Failed => text("⚠️").size(20).into(),
    };

    let style = tile.style;
    let framed = container(content)
        .center_x(Length::Fixed(width))
        .center_y(Length::Fixed(tile.height))
        .style(move |_theme: &Theme| tile_style(style));

    mouse_area(framed)
        .on_press(Message::TileTapped(position))
        .on_right_press(Message::TileLongPressed(position))
        .into()
}

fn tile_style(style: TileStyle) -> container::Style {
    match style {
        TileStyle::Normal => container::Style::default(),
        TileStyle::Selected => container::Style {
            border: Border {
                color: SELECTED_BORDER,
                width: 4.0,
                radius: 4.0.into(),
            },
            ..container::Style::default()
        },
    }
}

/// The contextual action buttons
pub fn action_bar<'a>(surface: ActionSurface, confirm_delete: bool) -> Element<'a, Message> {
    let buttons = match (surface, confirm_delete) {
        (ActionSurface::Idle, _) => row![
            button("Add from Gallery")
                .on_press(Message::PickFromGallery)
                .padding(10),
            button("Add from Camera")
                .on_press(Message::PickFromCamera)
                .padding(10),
        ],
        (ActionSurface::Selected, false) => row![
            button("Delete")
                .on_press(Message::DeleteRequested)
                .padding(10),
            button("Save").on_press(Message::SaveSelected).padding(10),
        ],
        (ActionSurface::Selected, true) => row![
            text("Delete this image?").size(16),
            button("Delete")
                .on_press(Message::DeleteConfirmed)
                .padding(10),
            button("Keep").on_press(Message::DeleteDismissed).padding(10),
        ],
    };

    buttons.spacing(10).align_y(Alignment::Center).into()
}
