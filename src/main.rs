use iced::keyboard::{self, key::Named, Key};
use iced::widget::scrollable::AbsoluteOffset;
use iced::widget::{button, column, container, image, row, scrollable, text};
use iced::{window, Alignment, Element, Length, Size, Subscription, Task, Theme};
use iced_aw::Wrap;
use rfd::FileDialog;
use std::sync::Arc;

mod config;
mod controller;
mod error;
mod imaging;
mod source;
mod state;
mod ui;

#[cfg(test)]
mod test_utils;

use config::Settings;
use controller::{BackOutcome, LibraryController, RenderDisposition, GRID_SESSION};
use source::SourceKind;
use state::data::ImageRecord;
use state::handoff::HandoffHolder;
use state::store::SqliteBlobStore;
use ui::grid::{NavigationRequest, RenderCompletion, ViewCommand};
use ui::surface::{GridSurface, ViewEffect, TILE_SPACING};

/// Padding around the screen content
const SCREEN_PADDING: f32 = 20.0;

/// Window width assumed until the first resize event
const INITIAL_WINDOW_WIDTH: f32 = 1024.0;

/// One image presented on its own, between grid sessions
struct FullView {
    /// Handed back to the next grid session
    store: SqliteBlobStore,
    records: Arc<[ImageRecord]>,
    position: usize,
    handle: Option<image::Handle>,
}

impl FullView {
    fn show(&mut self, position: usize) {
        self.position = position;
        self.handle = self
            .records
            .get(position)
            .map(|record| image::Handle::from_bytes(record.bytes.to_vec()));
    }
}

enum Screen {
    Grid(LibraryController<SqliteBlobStore>),
    FullView(FullView),
}

/// Main application state
struct PhotoGrid {
    /// `None` only while switching screens inside `update`
    screen: Option<Screen>,
    handoff: HandoffHolder,
    settings: Settings,
    surface: GridSurface,
    confirm_delete: bool,
    scroll_id: scrollable::Id,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    PickFromGallery,
    PickFromCamera,
    TileTapped(usize),
    /// Right click on a tile
    TileLongPressed(usize),
    /// Escape or the back button
    BackPressed,
    DeleteRequested,
    DeleteConfirmed,
    DeleteDismissed,
    SaveSelected,
    /// Background thumbnail render finished
    ThumbnailRendered(RenderCompletion),
    ShowPrevious,
    ShowNext,
    WindowResized(Size),
}

impl PhotoGrid {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();

        // The app cannot function without its library
        let store = SqliteBlobStore::open(&settings.library_path())
            .expect("Failed to open the image library. Check permissions and disk space.");
        log::info!(
            "📚 Library at {} holds {} blobs",
            store.path().display(),
            store.blob_count().unwrap_or(0)
        );

        let mut handoff = HandoffHolder::new();
        let (controller, commands) =
            LibraryController::open(store, &mut handoff, GRID_SESSION, Some(0));

        let mut surface = GridSurface::new(
            settings.tile_width,
            INITIAL_WINDOW_WIDTH - 2.0 * SCREEN_PADDING,
        );
        surface.begin_session(controller.transition_pending());
        surface.status = format!("{} images in library.", controller.len());

        let mut app = PhotoGrid {
            screen: Some(Screen::Grid(controller)),
            handoff,
            settings,
            surface,
            confirm_delete: false,
            scroll_id: scrollable::Id::unique(),
        };
        let task = app.apply(commands);
        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFromGallery => self.add_from(SourceKind::Gallery),
            Message::PickFromCamera => self.add_from(SourceKind::Camera),
            Message::TileTapped(position) => {
                let Some(Screen::Grid(controller)) = &mut self.screen else {
                    return Task::none();
                };
                let commands = controller.on_tap(position);
                self.apply(commands)
            }
            Message::TileLongPressed(position) => {
                self.confirm_delete = false;
                let Some(Screen::Grid(controller)) = &mut self.screen else {
                    return Task::none();
                };
                let commands = controller.on_long_press(position);
                self.apply(commands)
            }
            Message::BackPressed => {
                if self.confirm_delete {
                    return self.update(Message::DeleteDismissed);
                }
                if matches!(self.screen, Some(Screen::FullView(_))) {
                    return self.return_to_grid();
                }
                let Some(Screen::Grid(controller)) = &mut self.screen else {
                    return Task::none();
                };
                match controller.on_back() {
                    BackOutcome::Consumed(commands) => self.apply(commands),
                    BackOutcome::PassThrough => {
                        log::info!("👋 Closing Photo Grid");
                        iced::exit()
                    }
                }
            }
            Message::DeleteRequested => {
                self.confirm_delete = true;
                Task::none()
            }
            Message::DeleteConfirmed => {
                self.confirm_delete = false;
                let Some(Screen::Grid(controller)) = &mut self.screen else {
                    return Task::none();
                };
                match controller.delete_selected() {
                    Ok(commands) => {
                        self.surface.status =
                            format!("🗑️  Deleted. {} images in library.", controller.len());
                        self.surface.board.prune(controller.records());
                        self.apply(commands)
                    }
                    Err(e) => {
                        log::error!("❌ Delete failed: {}", e);
                        self.surface.status = e.user_message();
                        Task::none()
                    }
                }
            }
            Message::DeleteDismissed => {
                // Dismissing the confirmation also drops the selection
                self.confirm_delete = false;
                let Some(Screen::Grid(controller)) = &mut self.screen else {
                    return Task::none();
                };
                let commands = controller.cancel_selection();
                self.apply(commands)
            }
            Message::SaveSelected => self.save_selected(),
            Message::ThumbnailRendered(completion) => {
                let Some(Screen::Grid(controller)) = &mut self.screen else {
                    return Task::none();
                };
                match controller.on_render_complete(&completion) {
                    RenderDisposition::Accepted(commands) => {
                        self.surface.board.finish(completion);
                        self.apply(commands)
                    }
                    RenderDisposition::Stale => Task::none(),
                }
            }
            Message::ShowPrevious | Message::ShowNext => {
                if let Some(Screen::FullView(view)) = &mut self.screen {
                    let position = match message {
                        Message::ShowPrevious => view.position.saturating_sub(1),
                        _ => (view.position + 1).min(view.records.len().saturating_sub(1)),
                    };
                    if position != view.position {
                        view.show(position);
                    }
                }
                Task::none()
            }
            Message::WindowResized(size) => {
                self.surface
                    .set_viewport_width(size.width - 2.0 * SCREEN_PADDING);
                Task::none()
            }
        }
    }

    /// Carry out the controller's view commands
    fn apply(&mut self, commands: Vec<ViewCommand>) -> Task<Message> {
        let tasks: Vec<Task<Message>> = self
            .surface
            .apply(commands)
            .into_iter()
            .map(|effect| match effect {
                ViewEffect::Render { position, record } => Task::perform(
                    ui::grid::render(position, record, self.settings.thumbnail_size),
                    Message::ThumbnailRendered,
                ),
                ViewEffect::Complete(completion) => {
                    Task::done(Message::ThumbnailRendered(completion))
                }
                ViewEffect::Navigate(request) => {
                    self.open_full_view(request);
                    Task::none()
                }
                ViewEffect::ScrollTo { offset } => scrollable::scroll_to(
                    self.scroll_id.clone(),
                    AbsoluteOffset { x: 0.0, y: offset },
                ),
            })
            .collect();

        Task::batch(tasks)
    }

    fn add_from(&mut self, kind: SourceKind) -> Task<Message> {
        // Native dialogs block until closed
        let outcome = source::request_image(kind);

        let Some(Screen::Grid(controller)) = &mut self.screen else {
            return Task::none();
        };
        match controller.add_image(outcome) {
            Ok(commands) => {
                if !commands.is_empty() {
                    self.surface.status =
                        format!("✅ Added. {} images in library.", controller.len());
                }
                self.apply(commands)
            }
            Err(e) => {
                log::error!("❌ Adding image failed: {}", e);
                self.surface.status = e.user_message();
                Task::none()
            }
        }
    }

    fn save_selected(&mut self) -> Task<Message> {
        let Some(Screen::Grid(controller)) = &mut self.screen else {
            return Task::none();
        };
        let Some(record) = controller.selected_record() else {
            return Task::none();
        };

        let file_name = format!("{}.{}", record.id, imaging::extension_for(&record.bytes));
        let Some(path) = FileDialog::new()
            .set_title("Save Image")
            .set_file_name(file_name.as_str())
            .save_file()
        else {
            return Task::none();
        };

        self.surface.status = match controller.export_selected(&path) {
            Ok(_) => format!("✅ Saved to {}", path.display()),
            Err(e) => {
                log::error!("❌ Save failed: {}", e);
                e.user_message()
            }
        };
        Task::none()
    }

    /// Close the grid session and present `position` on its own
    fn open_full_view(&mut self, request: NavigationRequest) {
        let position = request.position;
        match self.screen.take() {
            Some(Screen::Grid(controller)) => {
                log::info!(
                    "🖼️  Full view at {} (shared tile {}, held out of exit {})",
                    position,
                    request.shared_element,
                    request.exclude_from_exit
                );
                let store = controller.close(&mut self.handoff, GRID_SESSION);
                let records = self
                    .handoff
                    .peek(GRID_SESSION)
                    .unwrap_or_else(|| Arc::from(Vec::new()));

                let mut view = FullView {
                    store,
                    records,
                    position,
                    handle: None,
                };
                view.show(position);

                self.confirm_delete = false;
                self.screen = Some(Screen::FullView(view));
            }
            other => self.screen = other,
        }
    }

    /// Open a new grid session armed on the image shown last
    fn return_to_grid(&mut self) -> Task<Message> {
        match self.screen.take() {
            Some(Screen::FullView(view)) => {
                let (controller, commands) = LibraryController::open(
                    view.store,
                    &mut self.handoff,
                    GRID_SESSION,
                    Some(view.position),
                );
                self.surface.begin_session(controller.transition_pending());
                self.screen = Some(Screen::Grid(controller));
                self.apply(commands)
            }
            other => {
                self.screen = other;
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        match &self.screen {
            Some(Screen::FullView(view)) => self.full_view(view),
            _ => self.grid_view(),
        }
    }

    fn grid_view(&self) -> Element<Message> {
        let empty = match &self.screen {
            Some(Screen::Grid(controller)) => controller.is_empty(),
            _ => self.surface.board.is_empty(),
        };

        let body: Element<Message> = if empty {
            container(
                text("Your library is empty. Add an image from the gallery or the camera.")
                    .size(18),
            )
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
        } else if !self.surface.revealed {
            container(text("Loading…").size(18))
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into()
        } else {
            let tiles = self
                .surface
                .board
                .tiles()
                .iter()
                .enumerate()
                .map(|(position, tile)| {
                    ui::tiles::tile_view(position, tile, self.surface.tile_width())
                })
                .collect();

            scrollable(
                Wrap::with_elements(tiles)
                    .spacing(TILE_SPACING)
                    .line_spacing(TILE_SPACING),
            )
                .id(self.scroll_id.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .into()
        };

        column![
            body,
            ui::tiles::action_bar(self.surface.actions, self.confirm_delete),
            text(&self.surface.status).size(14),
        ]
        .spacing(12)
        .padding(SCREEN_PADDING)
        .into()
    }

    fn full_view<'a>(&'a self, view: &'a FullView) -> Element<'a, Message> {
        let picture: Element<Message> = match &view.handle {
            Some(handle) => image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => text("Image not found").size(18).into(),
        };

        let last = view.records.len().saturating_sub(1);
        let controls = row![
            button("Back to Grid")
                .on_press(Message::BackPressed)
                .padding(10),
            button("Previous")
                .on_press_maybe((view.position > 0).then_some(Message::ShowPrevious))
                .padding(10),
            button("Next")
                .on_press_maybe((view.position < last).then_some(Message::ShowNext))
                .padding(10),
            text(format!("{} / {}", view.position + 1, view.records.len())).size(16),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        column![
            container(picture)
                .center_x(Length::Fill)
                .center_y(Length::Fill),
            controls,
        ]
        .spacing(12)
        .padding(SCREEN_PADDING)
        .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            keyboard::on_key_press(|key, _modifiers| match key {
                Key::Named(Named::Escape) => Some(Message::BackPressed),
                Key::Named(Named::ArrowLeft) => Some(Message::ShowPrevious),
                Key::Named(Named::ArrowRight) => Some(Message::ShowNext),
                _ => None,
            }),
            window::resize_events().map(|(_id, size)| Message::WindowResized(size)),
        ])
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application("Photo Grid", PhotoGrid::update, PhotoGrid::view)
        .theme(PhotoGrid::theme)
        .subscription(PhotoGrid::subscription)
        .centered()
        .run_with(PhotoGrid::new)
}
