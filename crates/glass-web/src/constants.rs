// DOM-side constants for the web host.

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

// Overlay stacking
pub const Z_INDEX_FLOATING: &str = "999"; // draggable overlays float above the page
pub const Z_INDEX_INLINE: &str = "1";

// Settle animation when a drag ends
pub const SETTLE_TRANSITION: &str = "transform 0.1s ease-out";

// Data attribute marking the overlay of an instance
pub const INSTANCE_ATTR: &str = "data-vaso-id";
