//! Column names as constants for type safety

/// 1-based pulse index, first dimension of the time-domain cube
pub const SWIM_ID: &str = "swim_id";
/// Frequency bin, first dimension of the frequency-domain cube
pub const FREQUENCY: &str = "frequency";
/// Mass-to-charge ratio (MS:1000040), second dimension of both cubes
pub const MASS_CHARGE: &str = "mass_charge";
/// Signal intensity (MS:1000042), time-domain cell value
pub const INTENSITY: &str = "intensity";
/// Spectral power, frequency-domain cell value
pub const AMPLITUDE: &str = "amplitude";
