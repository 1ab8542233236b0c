/// The image library controller
///
/// One controller lives for one grid session: it is opened when the grid
/// becomes active and closed when the user leaves it. It owns the
/// collection, the selection and the continuity latch, and talks to the
/// view only through `ViewCommand`s and the events handed to it.

use std::path::Path;

use crate::error::{LibraryError, Result};
use crate::source::SourceOutcome;
use crate::state::collection::ImageCollection;
use crate::state::data::{ImageId, ImageRecord};
use crate::state::handoff::HandoffHolder;
use crate::state::selection::Selection;
use crate::state::store::BlobStore;
use crate::state::transition::TransitionCoordinator;
use crate::ui::grid::{self, ActionSurface, NavigationRequest, RenderCompletion, ViewCommand};

/// Handoff key of the grid session
pub const GRID_SESSION: &str = "grid";

/// What happened to a back press
#[derive(Debug, PartialEq)]
pub enum BackOutcome {
    /// The back press cleared the selection
    Consumed(Vec<ViewCommand>),
    /// Nothing to clear; let the back press through
    PassThrough,
}

/// What happened to a render completion
#[derive(Debug, PartialEq)]
pub enum RenderDisposition {
    /// The completion matched the current record at its position
    Accepted(Vec<ViewCommand>),
    /// The position was removed or rebound while the render was in flight
    Stale,
}

#[derive(Debug)]
pub struct LibraryController<S> {
    collection: ImageCollection<S>,
    selection: Selection,
    transition: TransitionCoordinator,
}

impl<S: BlobStore> LibraryController<S> {
    /// Start a grid session.
    ///
    /// Takes the in-memory sequence from `handoff` when a previous session
    /// left one, otherwise loads everything from `store`. `target` is the
    /// position whose thumbnail gates the enter transition; it is ignored
    /// when it does not exist.
    pub fn open(
        store: S,
        handoff: &mut HandoffHolder,
        session: &str,
        target: Option<usize>,
    ) -> (Self, Vec<ViewCommand>) {
        let mut collection = ImageCollection::new(store);
        let mut commands = Vec::new();

        match handoff.take(session) {
            Some(records) => collection.restore_from(records.iter().cloned()),
            None => match collection.load_all() {
                Ok(report) if report.skipped > 0 => {
                    commands.push(ViewCommand::Notify(format!(
                        "{} image(s) could not be read",
                        report.skipped
                    )));
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("❌ {}", e);
                    commands.push(ViewCommand::Notify(e.user_message()));
                }
            },
        }

        let mut transition = TransitionCoordinator::new();
        if let Some(position) = target.filter(|&p| p < collection.len()) {
            transition.arm(position);
        }

        commands.extend(grid::rebind_from(collection.records(), 0));
        commands.push(ViewCommand::SetActions(ActionSurface::Idle));

        log::info!(
            "🎨 Grid session opened with {} images ({:?})",
            collection.len(),
            transition.latch()
        );

        let controller = LibraryController {
            collection,
            selection: Selection::None,
            transition,
        };
        (controller, commands)
    }

    /// End the session: disarm, hand the sequence over, give the store back
    pub fn close(mut self, handoff: &mut HandoffHolder, session: &str) -> S {
        self.transition.disarm();
        let (store, records) = self.collection.into_parts();
        log::info!("👋 Grid session closed with {} images", records.len());
        handoff.stash(session, records);
        store
    }

    pub fn records(&self) -> &[ImageRecord] {
        self.collection.records()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The enter transition is armed and has not fired yet
    pub fn transition_pending(&self) -> bool {
        self.transition.is_pending()
    }

    pub fn selected_record(&self) -> Option<&ImageRecord> {
        self.selection
            .selected()
            .and_then(|position| self.collection.get(position))
    }

    /// Handle the outcome of an image source request
    pub fn add_image(&mut self, outcome: SourceOutcome) -> Result<Vec<ViewCommand>> {
        let bytes = match outcome.into_bytes() {
            Ok(bytes) => bytes,
            // Cancelling the picker is not an error
            Err(LibraryError::SourceCancelled) => {
                log::debug!("Image source cancelled");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        self.collection.append(bytes)?;
        let position = self.collection.len() - 1;
        Ok(grid::rebind_from(self.collection.records(), position))
    }

    /// Tap on a tile: open the full view at that position
    pub fn on_tap(&mut self, position: usize) -> Vec<ViewCommand> {
        if position >= self.collection.len() {
            log::warn!("⚠️  Ignoring tap on missing position {}", position);
            return Vec::new();
        }
        vec![ViewCommand::Navigate(NavigationRequest::to(position))]
    }

    /// Long press on a tile: select it, move the selection, or deselect it
    pub fn on_long_press(&mut self, position: usize) -> Vec<ViewCommand> {
        if position >= self.collection.len() {
            log::warn!("⚠️  Ignoring long press on missing position {}", position);
            return Vec::new();
        }
        let affected = self.selection.select_or_toggle(position);
        grid::restyle(&affected, &self.selection)
    }

    /// Back press: clears a selection if there is one
    pub fn on_back(&mut self) -> BackOutcome {
        if self.selection.is_selected() {
            BackOutcome::Consumed(self.cancel_selection())
        } else {
            BackOutcome::PassThrough
        }
    }

    /// Explicit cancel of the selection
    pub fn cancel_selection(&mut self) -> Vec<ViewCommand> {
        let affected = self.selection.clear();
        grid::restyle(&affected, &self.selection)
    }

    /// Delete the selected image.
    ///
    /// Nothing changes if the store refuses the delete; the selection is
    /// kept so the user can retry.
    pub fn delete_selected(&mut self) -> Result<Vec<ViewCommand>> {
        let index = self.selection.selected().ok_or(LibraryError::NothingSelected)?;
        self.collection.remove_at(index)?;

        let new_len = self.collection.len();
        self.selection.on_removed(index, new_len);

        let mut commands = grid::restyle(&[index], &self.selection);
        commands.extend(grid::rebind_from(self.collection.records(), index));

        if let Some(armed) = self.transition.armed_position() {
            if self.transition.is_pending() && armed >= new_len {
                self.transition.disarm();
                commands.push(ViewCommand::CancelContinuityTransition);
            }
        }

        Ok(commands)
    }

    /// Write a copy of the selected image to `path`
    pub fn export_selected(&self, path: &Path) -> Result<ImageId> {
        let record = self.selected_record().ok_or(LibraryError::NothingSelected)?;
        std::fs::write(path, &record.bytes).map_err(LibraryError::Export)?;
        log::info!("💾 Exported image {} to {}", record.id, path.display());
        Ok(record.id.clone())
    }

    /// A thumbnail render finished.
    ///
    /// Completions for positions that were removed or now hold a different
    /// record are discarded. Failed renders count as complete so a broken
    /// thumbnail cannot hold the enter transition forever.
    pub fn on_render_complete(&mut self, completion: &RenderCompletion) -> RenderDisposition {
        match self.collection.get(completion.position) {
            Some(record) if record.id == completion.id => {}
            _ => {
                log::warn!(
                    "⚠️  Discarding stale render of {} at position {}",
                    completion.id,
                    completion.position
                );
                return RenderDisposition::Stale;
            }
        }

        if !completion.outcome.is_success() {
            log::debug!("Render of {} failed, counting it as complete", completion.id);
        }

        let commands = self
            .transition
            .notify_render_complete(completion.position)
            .map(|signal| ViewCommand::BeginContinuityTransition {
                position: signal.position,
            })
            .into_iter()
            .collect();
        RenderDisposition::Accepted(commands)
    }
}
