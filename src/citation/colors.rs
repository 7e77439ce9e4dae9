//! Display palette for citations.

/// A named highlight color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CitationColor {
    pub name: &'static str,
    pub hex: &'static str,
}

pub const CITATION_COLORS: [CitationColor; 6] = [
    CitationColor { name: "amber", hex: "#f59e0b" },
    CitationColor { name: "cyan", hex: "#06b6d4" },
    CitationColor { name: "violet", hex: "#8b5cf6" },
    CitationColor { name: "emerald", hex: "#10b981" },
    CitationColor { name: "rose", hex: "#f43f5e" },
    CitationColor { name: "orange", hex: "#f97316" },
];

/// Color for the citation at `index`, cycling through the palette
pub fn citation_color(index: usize) -> CitationColor {
    CITATION_COLORS[index % CITATION_COLORS.len()]
}
