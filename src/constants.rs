/// Offset between Kelvin and degrees Celsius.
pub const KELVIN: f64 = 273.15;

/// Porosity assigned to air cells above the topography.
pub const AIR_POROSITY: f64 = 1.0e-10;
/// Permeability assigned to air cells above the topography.
pub const AIR_PERMEABILITY: f64 = 1.0e-22;

/// Fallback porosity when no unit table is supplied.
pub const DEFAULT_POROSITY: f64 = 0.01;
/// Fallback permeability when no unit table is supplied.
pub const DEFAULT_PERMEABILITY: f64 = 1.0e-14;
/// Fallback vertical thermal conductivity when no unit table is supplied.
pub const DEFAULT_CONDUCTIVITY: f64 = 3.74;

// Fixed columns of a SHEMAT-Suite `# units` row, shared by every unit.
pub const UNIT_COMPRESSIBILITY: f64 = 1.0e-10;
pub const UNIT_HEAT_CAPACITY: f64 = 2_077_074.0;
pub const UNIT_HEAT_PRODUCTION: f64 = 10.0;
pub const UNIT_DISPERSIVITY: f64 = 2.0e-3;
