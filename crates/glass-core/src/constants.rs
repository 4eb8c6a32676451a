// Engine tuning constants shared by the web and native hosts.

// Rasterization
pub const DEVICE_SAMPLE_SCALE: f64 = 0.75; // bitmap resolution relative to the overlay box
pub const MAX_SCALE_NORMALIZATION: f64 = 0.5; // applied to the observed peak displacement
pub const NEUTRAL_BYTE: u8 = 128; // encoded zero displacement
pub const MAX_RASTER_PIXELS: usize = 4096 * 4096; // larger bitmaps fall back to the neutral field

// Fragment shaping
pub const FALLOFF_BAND: f64 = 0.8; // outer edge of the smoothstep falloff
pub const COMPRESSION_STRENGTH: f64 = 0.7; // inward pull when depth or intensity is negative

// Cache
pub const FIELD_CACHE_CAPACITY: usize = 10;

// Scheduling
pub const FALLBACK_FRAME_MS: u64 = 16; // timer tick used when no frame callback exists

// Layout
pub const AUTO_SIZE_FALLBACK: f64 = 200.0; // draggable content that measures as zero
pub const MAX_EXPLICIT_SIZE: f64 = 10_000.0; // px, upper clamp for configured width/height
pub const SHADOW_SPAN_MIN: f64 = 100.0;
pub const SHADOW_SPAN_MAX: f64 = 800.0;
pub const SHADOW_SPAN_UNIT: f64 = 400.0;

// Filter region, as fractions of the overlay box
pub const FILTER_REGION_INSET: &str = "-5%";
pub const FILTER_REGION_EXTENT: &str = "110%";
