/// Live pressure acquisition.
///
/// Submodules:
/// - `iem` — ASOS station pressure from the Iowa Environmental Mesonet.

pub mod iem;
