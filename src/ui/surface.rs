/// Grid surface: the view-side state the controller's commands drive
///
/// `apply` turns a command list into state changes plus the effects the
/// application still has to run (thumbnail decodes, navigation, scrolling).

use crate::state::data::ImageRecord;
use crate::ui::grid::{
    ActionSurface, NavigationRequest, RenderCompletion, RenderOutcome, ViewCommand,
};
use crate::ui::tiles::TileBoard;

/// Gap between tiles, both within a row and between rows
pub const TILE_SPACING: f32 = 8.0;

/// Work left to the application after applying commands
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEffect {
    /// Decode the thumbnail for `record` off the UI thread
    Render { position: usize, record: ImageRecord },
    /// Feed this completion straight back; nothing needs decoding
    Complete(RenderCompletion),
    Navigate(NavigationRequest),
    /// Scroll the grid so `offset` (logical pixels) is at the top
    ScrollTo { offset: f32 },
}

#[derive(Debug)]
pub struct GridSurface {
    pub board: TileBoard,
    pub actions: ActionSurface,
    /// Hidden until the armed thumbnail is ready
    pub revealed: bool,
    /// Status message to display to the user
    pub status: String,
    tile_width: f32,
    /// Width available to the tile rows
    viewport_width: f32,
}

impl GridSurface {
    pub fn new(tile_width: f32, viewport_width: f32) -> Self {
        GridSurface {
            board: TileBoard::default(),
            actions: ActionSurface::Idle,
            revealed: true,
            status: String::new(),
            tile_width,
            viewport_width,
        }
    }

    pub fn tile_width(&self) -> f32 {
        self.tile_width
    }

    /// A grid session opened; stay hidden while its transition is pending
    pub fn begin_session(&mut self, transition_pending: bool) {
        self.revealed = !transition_pending;
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width;
    }

    /// Carry out `commands`, returning what the application must still do
    pub fn apply(&mut self, commands: Vec<ViewCommand>) -> Vec<ViewEffect> {
        let mut effects = Vec::new();

        for command in commands {
            match command {
                ViewCommand::ItemRangeChanged { start, new_len } => {
                    self.board.resize(start, new_len);
                }
                ViewCommand::Render { position, record } => {
                    if self.board.bind(position, &record, self.tile_width) {
                        effects.push(ViewEffect::Complete(RenderCompletion {
                            position,
                            id: record.id.clone(),
                            outcome: RenderOutcome::Reused,
                        }));
                    } else {
                        effects.push(ViewEffect::Render { position, record });
                    }
                }
                ViewCommand::SetStyle { position, style } => self.board.set_style(position, style),
                ViewCommand::SetActions(surface) => self.actions = surface,
                ViewCommand::Navigate(request) => effects.push(ViewEffect::Navigate(request)),
                ViewCommand::BeginContinuityTransition { position } => {
                    self.revealed = true;
                    effects.push(ViewEffect::ScrollTo {
                        offset: self.row_offset(position),
                    });
                }
                ViewCommand::CancelContinuityTransition => self.revealed = true,
                ViewCommand::Notify(message) => self.status = message,
            }
        }

        effects
    }

    /// How many tiles the wrap layout fits on one row
    pub fn tiles_per_row(&self) -> usize {
        let per_row = (self.viewport_width + TILE_SPACING) / (self.tile_width + TILE_SPACING);
        if per_row.is_finite() && per_row >= 1.0 {
            per_row as usize
        } else {
            1
        }
    }

    /// Top of the row holding `position`
    ///
    /// A row is as tall as its tallest tile, since tile heights follow each
    /// image's aspect ratio.
    pub fn row_offset(&self, position: usize) -> f32 {
        let per_row = self.tiles_per_row();
        let target_row = position.min(self.board.len().saturating_sub(1)) / per_row;

        self.board
            .tiles()
            .chunks(per_row)
            .take(target_row)
            .map(|row| {
                row.iter().map(|tile| tile.height).fold(0.0, f32::max) + TILE_SPACING
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::thumbnail::Thumbnail;
    use crate::state::data::ImageId;
    use crate::test_utils::record_from;
    use crate::ui::grid::{rebind_from, TileStyle};
    use crate::ui::tiles::TileImage;

    /// 100px tiles in a 320px viewport: three per row
    fn surface() -> GridSurface {
        GridSurface::new(100.0, 320.0)
    }

    fn square(id: &str) -> ImageRecord {
        record_from(id, 10, 10, [0, 0, 0])
    }

    #[test]
    fn test_uncached_render_becomes_decode_effect() {
        let mut surface = surface();
        let records = vec![square("a"), square("b")];

        let effects = surface.apply(rebind_from(&records, 0));

        assert_eq!(
            effects,
            vec![
                ViewEffect::Render { position: 0, record: records[0].clone() },
                ViewEffect::Render { position: 1, record: records[1].clone() },
            ]
        );
        assert_eq!(surface.board.len(), 2);
    }

    #[test]
    fn test_cached_thumbnail_completes_as_reused() {
        let mut surface = surface();
        let records = vec![square("a"), square("b")];
        surface.apply(rebind_from(&records, 0));
        surface.board.finish(RenderCompletion {
            position: 1,
            id: ImageId::from("b"),
            outcome: RenderOutcome::Rendered(Thumbnail {
                width: 1,
                height: 1,
                rgba: vec![0, 0, 0, 255],
            }),
        });

        // "a" deleted: "b" is rebound at position 0 from the cache
        let effects = surface.apply(rebind_from(&records[1..], 0));

        assert_eq!(
            effects,
            vec![ViewEffect::Complete(RenderCompletion {
                position: 0,
                id: ImageId::from("b"),
                outcome: RenderOutcome::Reused,
            })]
        );
        assert!(matches!(surface.board.tiles()[0].image, TileImage::Ready(_)));
    }

    #[test]
    fn test_pending_session_reveals_on_begin_with_scroll() {
        let mut surface = surface();
        let records: Vec<ImageRecord> = (0..7).map(|i| square(&format!("{}", i))).collect();
        surface.begin_session(true);
        surface.apply(rebind_from(&records, 0));
        assert!(!surface.revealed);

        let effects = surface.apply(vec![ViewCommand::BeginContinuityTransition { position: 4 }]);

        assert!(surface.revealed);
        // Position 4 sits on the second row of three
        assert_eq!(effects, vec![ViewEffect::ScrollTo { offset: 108.0 }]);
    }

    #[test]
    fn test_cancel_reveals_without_scrolling() {
        let mut surface = surface();
        surface.begin_session(true);

        let effects = surface.apply(vec![ViewCommand::CancelContinuityTransition]);

        assert!(surface.revealed);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_session_without_pending_transition_is_visible() {
        let mut surface = surface();
        surface.begin_session(false);
        assert!(surface.revealed);
    }

    #[test]
    fn test_style_actions_and_notify_change_state_only() {
        let mut surface = surface();
        surface.apply(rebind_from(&[square("a")], 0));

        let effects = surface.apply(vec![
            ViewCommand::SetStyle { position: 0, style: TileStyle::Selected },
            ViewCommand::SetActions(ActionSurface::Selected),
            ViewCommand::Notify("Saving the image failed".to_string()),
        ]);

        assert!(effects.is_empty());
        assert_eq!(surface.board.tiles()[0].style, TileStyle::Selected);
        assert_eq!(surface.actions, ActionSurface::Selected);
        assert_eq!(surface.status, "Saving the image failed");
    }

    #[test]
    fn test_navigate_is_passed_through() {
        let mut surface = surface();
        let request = NavigationRequest::to(2);
        assert_eq!(
            surface.apply(vec![ViewCommand::Navigate(request)]),
            vec![ViewEffect::Navigate(request)]
        );
    }

    #[test]
    fn test_tiles_per_row_follows_viewport() {
        let mut surface = surface();
        assert_eq!(surface.tiles_per_row(), 3);

        surface.set_viewport_width(50.0);
        assert_eq!(surface.tiles_per_row(), 1);

        surface.set_viewport_width(1000.0);
        assert_eq!(surface.tiles_per_row(), 9);
    }

    #[test]
    fn test_row_offset_uses_tallest_tile_per_row() {
        let mut surface = surface();
        let records = vec![
            record_from("a", 10, 10, [0, 0, 0]),
            record_from("b", 10, 20, [0, 0, 0]),
            record_from("c", 20, 10, [0, 0, 0]),
            record_from("d", 10, 10, [0, 0, 0]),
            record_from("e", 10, 10, [0, 0, 0]),
        ];
        surface.apply(rebind_from(&records, 0));

        assert_eq!(surface.row_offset(0), 0.0);
        assert_eq!(surface.row_offset(2), 0.0);
        // First row is 200px tall because of "b"
        assert_eq!(surface.row_offset(3), 208.0);
        assert_eq!(surface.row_offset(99), 208.0);
    }
}
