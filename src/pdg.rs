// PDG particle codes and nuclear ion code helpers
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const PDG_PROTON: i32 = 2212;
pub const PDG_NEUTRON: i32 = 2112;
pub const PDG_NU_E: i32 = 12;
pub const PDG_NU_MU: i32 = 14;
pub const PDG_NU_TAU: i32 = 16;
pub const PDG_PI_PLUS: i32 = 211;

/// Nucleon mass in GeV used by the built-in cross section models.
pub const NUCLEON_MASS: f64 = 0.938_272;
/// Charged pion mass in GeV.
pub const PION_MASS: f64 = 0.139_570;

/// Names of the particles the generator deals with directly.
///
/// Nuclear targets are not listed here; their names are derived from the ion
/// code by [`particle_name`].
pub static PARTICLE_NAMES: Lazy<HashMap<i32, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(PDG_NU_E, "nu_e");
    m.insert(-PDG_NU_E, "nu_e_bar");
    m.insert(PDG_NU_MU, "nu_mu");
    m.insert(-PDG_NU_MU, "nu_mu_bar");
    m.insert(PDG_NU_TAU, "nu_tau");
    m.insert(-PDG_NU_TAU, "nu_tau_bar");
    m.insert(PDG_PROTON, "proton");
    m.insert(PDG_NEUTRON, "neutron");
    m.insert(PDG_PI_PLUS, "pi+");
    m.insert(-PDG_PI_PLUS, "pi-");
    m.insert(111, "pi0");
    m
});

/// Element symbols indexed by atomic number (index 0 unused).
static ELEMENT_SYMBOLS: &[&str] = &[
    "", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U",
];

#[inline]
pub fn is_neutrino(pdg: i32) -> bool {
    matches!(pdg, PDG_NU_E | PDG_NU_MU | PDG_NU_TAU)
}

#[inline]
pub fn is_anti_neutrino(pdg: i32) -> bool {
    matches!(-pdg, PDG_NU_E | PDG_NU_MU | PDG_NU_TAU)
}

#[inline]
pub fn is_neutral_lepton(pdg: i32) -> bool {
    is_neutrino(pdg) || is_anti_neutrino(pdg)
}

#[inline]
pub fn is_nucleon(pdg: i32) -> bool {
    pdg == PDG_PROTON || pdg == PDG_NEUTRON
}

/// True for nuclear ion codes of the form `10LZZZAAAI`.
#[inline]
pub fn is_ion(pdg: i32) -> bool {
    pdg > 1_000_000_000 && pdg < 1_100_000_000
}

/// Build an ion code from proton number `z` and mass number `a`.
pub fn ion_pdg_code(z: u32, a: u32) -> i32 {
    1_000_000_000 + (z as i32) * 10_000 + (a as i32) * 10
}

/// Proton number of a target. Free protons count as Z=1, free neutrons Z=0.
pub fn target_z(pdg: i32) -> Option<u32> {
    match pdg {
        PDG_PROTON => Some(1),
        PDG_NEUTRON => Some(0),
        p if is_ion(p) => Some(((p / 10_000) % 1000) as u32),
        _ => None,
    }
}

/// Mass number of a target. Free nucleons count as A=1.
pub fn target_a(pdg: i32) -> Option<u32> {
    match pdg {
        PDG_PROTON | PDG_NEUTRON => Some(1),
        p if is_ion(p) => Some(((p / 10) % 1000) as u32),
        _ => None,
    }
}

/// Neutron number N = A - Z.
pub fn target_n(pdg: i32) -> Option<u32> {
    let z = target_z(pdg)?;
    let a = target_a(pdg)?;
    a.checked_sub(z)
}

/// Human readable name, e.g. `"nu_mu"` or `"Fe56"`.
pub fn particle_name(pdg: i32) -> String {
    if let Some(name) = PARTICLE_NAMES.get(&pdg) {
        return name.to_string();
    }
    if is_ion(pdg) {
        let z = target_z(pdg).unwrap_or(0) as usize;
        let a = target_a(pdg).unwrap_or(0);
        let symbol = ELEMENT_SYMBOLS.get(z).copied().unwrap_or("X");
        return format!("{}{}", symbol, a);
    }
    format!("pdg{}", pdg)
}

/// Parse a comma separated list of PDG codes, ignoring empty fields.
pub fn parse_pdg_list(list: &str) -> Result<Vec<i32>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i32>().map_err(|_| s.to_string()))
        .collect()
}
