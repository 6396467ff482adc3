use phf::{Map, Set, phf_map, phf_set};

/// Mass of deuterium in Daltons.
pub const DEUTERIUM_MASS: f64 = 2.01410177812;
/// Mass of tritium in Daltons.
pub const TRITIUM_MASS: f64 = 3.0160492779;

static ISOTOPE_MASSES: Map<&'static str, f64> = phf_map! {
    "D" => DEUTERIUM_MASS,
    "T" => TRITIUM_MASS,
};

static HYDROGEN_ISOTOPES: Set<&'static str> = phf_set! { "H", "D", "T" };

/// Conventional standard atomic weights (Da), with mass numbers of the most stable
/// isotope for elements that have none.
static ATOMIC_WEIGHTS: Map<&'static str, f64> = phf_map! {
    "H" => 1.008, "He" => 4.0026, "Li" => 6.94, "Be" => 9.0122, "B" => 10.81,
    "C" => 12.011, "N" => 14.007, "O" => 15.999, "F" => 18.998, "Ne" => 20.180,
    "Na" => 22.990, "Mg" => 24.305, "Al" => 26.982, "Si" => 28.085, "P" => 30.974,
    "S" => 32.06, "Cl" => 35.45, "Ar" => 39.948, "K" => 39.098, "Ca" => 40.078,
    "Sc" => 44.956, "Ti" => 47.867, "V" => 50.942, "Cr" => 51.996, "Mn" => 54.938,
    "Fe" => 55.845, "Co" => 58.933, "Ni" => 58.693, "Cu" => 63.546, "Zn" => 65.38,
    "Ga" => 69.723, "Ge" => 72.630, "As" => 74.922, "Se" => 78.971, "Br" => 79.904,
    "Kr" => 83.798, "Rb" => 85.468, "Sr" => 87.62, "Y" => 88.906, "Zr" => 91.224,
    "Nb" => 92.906, "Mo" => 95.95, "Tc" => 97.0, "Ru" => 101.07, "Rh" => 102.91,
    "Pd" => 106.42, "Ag" => 107.87, "Cd" => 112.41, "In" => 114.82, "Sn" => 118.71,
    "Sb" => 121.76, "Te" => 127.60, "I" => 126.90, "Xe" => 131.29, "Cs" => 132.91,
    "Ba" => 137.33, "La" => 138.91, "Ce" => 140.12, "Pr" => 140.91, "Nd" => 144.24,
    "Pm" => 145.0, "Sm" => 150.36, "Eu" => 151.96, "Gd" => 157.25, "Tb" => 158.93,
    "Dy" => 162.50, "Ho" => 164.93, "Er" => 167.26, "Tm" => 168.93, "Yb" => 173.05,
    "Lu" => 174.97, "Hf" => 178.49, "Ta" => 180.95, "W" => 183.84, "Re" => 186.21,
    "Os" => 190.23, "Ir" => 192.22, "Pt" => 195.08, "Au" => 196.97, "Hg" => 200.59,
    "Tl" => 204.38, "Pb" => 207.2, "Bi" => 208.98, "Po" => 209.0, "At" => 210.0,
    "Rn" => 222.0, "Fr" => 223.0, "Ra" => 226.0, "Ac" => 227.0, "Th" => 232.04,
    "Pa" => 231.04, "U" => 238.03, "Np" => 237.0, "Pu" => 244.0, "Am" => 243.0,
    "Cm" => 247.0, "Bk" => 247.0, "Cf" => 251.0, "Es" => 252.0, "Fm" => 257.0,
};

static METALS: Set<&'static str> = phf_set! {
    "Li", "Be", "Na", "Mg", "Al", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co",
    "Ni", "Cu", "Zn", "Ga", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd",
    "Ag", "Cd", "In", "Sn", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt",
    "Au", "Hg", "Tl", "Pb", "Bi", "Po", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu",
    "Am", "Cm", "Bk", "Cf", "Es", "Fm",
};

/// Typical X-H bond lengths in Angstroms used when placing hydrogens.
static XH_BOND_LENGTHS: Map<&'static str, f64> = phf_map! {
    "C" => 1.09,
    "N" => 1.01,
    "O" => 0.96,
    "B" => 1.19,
    "S" => 1.34,
    "P" => 1.42,
};

const DEFAULT_XH_BOND_LENGTH: f64 = 1.0;

pub fn is_hydrogen_isotope(symbol: &str) -> bool {
    HYDROGEN_ISOTOPES.contains(symbol)
}

/// Maps `D` and `T` to `H` and returns the isotope mass for them.
pub fn normalize_hydrogen_isotope(symbol: &str) -> (&str, Option<f64>) {
    match ISOTOPE_MASSES.get(symbol) {
        Some(&mass) => ("H", Some(mass)),
        None => (symbol, None),
    }
}

pub fn is_known_element(symbol: &str) -> bool {
    ATOMIC_WEIGHTS.contains_key(symbol)
}

pub fn atomic_weight(symbol: &str) -> Option<f64> {
    ATOMIC_WEIGHTS.get(symbol).copied()
}

pub fn is_metal(symbol: &str) -> bool {
    METALS.contains(symbol)
}

/// Default valences of the SMILES organic subset, in increasing order.
pub fn default_valences(symbol: &str) -> Option<&'static [u32]> {
    match symbol {
        "B" => Some(&[3]),
        "C" => Some(&[4]),
        "N" | "P" => Some(&[3, 5]),
        "O" => Some(&[2]),
        "S" => Some(&[2, 4, 6]),
        "F" | "Cl" | "Br" | "I" => Some(&[1]),
        _ => None,
    }
}

pub fn xh_bond_length(symbol: &str) -> f64 {
    XH_BOND_LENGTHS
        .get(symbol)
        .copied()
        .unwrap_or(DEFAULT_XH_BOND_LENGTH)
}
