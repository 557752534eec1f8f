/// A decimal SI prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prefix {
    pub symbol: &'static str,
    pub name: &'static str,
    pub factor: f64,
}

const fn prefix(symbol: &'static str, name: &'static str, factor: f64) -> Prefix {
    Prefix {
        symbol,
        name,
        factor,
    }
}

pub const SI_PREFIXES: [Prefix; 20] = [
    prefix("Y", "yotta", 1e24),
    prefix("Z", "zetta", 1e21),
    prefix("E", "exa", 1e18),
    prefix("P", "peta", 1e15),
    prefix("T", "tera", 1e12),
    prefix("G", "giga", 1e9),
    prefix("M", "mega", 1e6),
    prefix("k", "kilo", 1e3),
    prefix("h", "hecto", 1e2),
    prefix("da", "deca", 1e1),
    prefix("d", "deci", 1e-1),
    prefix("c", "centi", 1e-2),
    prefix("m", "milli", 1e-3),
    prefix("u", "micro", 1e-6),
    prefix("n", "nano", 1e-9),
    prefix("p", "pico", 1e-12),
    prefix("f", "femto", 1e-15),
    prefix("a", "atto", 1e-18),
    prefix("z", "zepto", 1e-21),
    prefix("y", "yocto", 1e-24),
];

pub fn find(symbol: &str) -> Option<&'static Prefix> {
    SI_PREFIXES.iter().find(|p| p.symbol == symbol)
}
