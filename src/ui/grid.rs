/// Grid binding: the contract between the library controller and the view
///
/// The controller never touches widgets. It emits `ViewCommand`s and the
/// view answers with events, including one `RenderCompletion` per render
/// request, delivered asynchronously.

use crate::imaging::thumbnail::{self, Thumbnail};
use crate::state::data::{ImageId, ImageRecord};
use crate::state::selection::Selection;

/// Visual state of one tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStyle {
    Normal,
    Selected,
}

/// The two configurations of the contextual action buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionSurface {
    /// Add from gallery / add from camera
    #[default]
    Idle,
    /// Delete / save the selected image
    Selected,
}

impl ActionSurface {
    /// The surface is a pure function of the selection
    pub fn for_selection(selection: &Selection) -> Self {
        if selection.is_selected() {
            ActionSurface::Selected
        } else {
            ActionSurface::Idle
        }
    }
}

/// Request to open the full-view presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationRequest {
    /// Position to present
    pub position: usize,
    /// Tile taking part in the shared continuity animation
    pub shared_element: usize,
    /// Tile left out of the grid's exit animation
    pub exclude_from_exit: usize,
}

impl NavigationRequest {
    pub fn to(position: usize) -> Self {
        NavigationRequest {
            position,
            shared_element: position,
            exclude_from_exit: position,
        }
    }
}

/// Instructions from the controller to the view layer
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    /// Positions from `start` on map to different records and the grid
    /// now holds `new_len` items
    ItemRangeChanged { start: usize, new_len: usize },
    /// Render the thumbnail of `record` at `position`
    Render { position: usize, record: ImageRecord },
    SetStyle { position: usize, style: TileStyle },
    SetActions(ActionSurface),
    Navigate(NavigationRequest),
    /// The thumbnail at `position` is ready; start the enter transition
    BeginContinuityTransition { position: usize },
    /// A pending enter transition will never fire; show the grid without it
    CancelContinuityTransition,
    /// Transient message for the user
    Notify(String),
}

/// How a thumbnail render ended
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(Thumbnail),
    /// The view already had this record's thumbnail
    Reused,
    Failed(String),
}

impl RenderOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RenderOutcome::Failed(_))
    }
}

/// Completion of one render request, keyed by position and identity
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCompletion {
    pub position: usize,
    pub id: ImageId,
    pub outcome: RenderOutcome,
}

/// Commands rebinding every position from `start` to the end
///
/// `start == records.len()` still announces the new length, which is how
/// removing the last item shrinks the grid.
pub fn rebind_from(records: &[ImageRecord], start: usize) -> Vec<ViewCommand> {
    if start > records.len() {
        return Vec::new();
    }

    let mut commands = Vec::with_capacity(records.len() - start + 1);
    commands.push(ViewCommand::ItemRangeChanged {
        start,
        new_len: records.len(),
    });
    commands.extend(
        records[start..]
            .iter()
            .enumerate()
            .map(|(offset, record)| ViewCommand::Render {
                position: start + offset,
                record: record.clone(),
            }),
    );
    commands
}

/// Restyle exactly `positions` according to `selection`
pub fn restyle(positions: &[usize], selection: &Selection) -> Vec<ViewCommand> {
    let mut commands: Vec<ViewCommand> = positions
        .iter()
        .map(|&position| ViewCommand::SetStyle {
            position,
            style: if selection.selected() == Some(position) {
                TileStyle::Selected
            } else {
                TileStyle::Normal
            },
        })
        .collect();
    commands.push(ViewCommand::SetActions(ActionSurface::for_selection(selection)));
    commands
}

/// Render the thumbnail for `record` at `position` off the UI thread
pub async fn render(position: usize, record: ImageRecord, size: u32) -> RenderCompletion {
    let id = record.id.clone();
    let outcome = match thumbnail::generate_thumbnail(record, size).await {
        Ok(thumb) => RenderOutcome::Rendered(thumb),
        Err(e) => {
            log::warn!("⚠️  Thumbnail for {} failed: {}", id, e);
            RenderOutcome::Failed(e.to_string())
        }
    };

    RenderCompletion {
        position,
        id,
        outcome,
    }
}
