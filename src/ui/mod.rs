/// User interface
///
/// - The controller/view contract and async thumbnail renders (grid.rs)
/// - View-side state driven by controller commands (surface.rs)
/// - Tile state and the widgets built from it (tiles.rs)

pub mod grid;
pub mod surface;
pub mod tiles;
