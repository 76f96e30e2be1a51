//! Game id → display name tables.
//!
//! Ids that are not listed are kept as their raw identifier so that no
//! information is lost when the game adds new content.

const RACES: &[(&str, &str)] = &[
    ("1", "Human"),
    ("2", "Dwarf"),
    ("3", "Skaven"),
    ("4", "Orc"),
    ("5", "Lizardman"),
    ("6", "Goblin"),
    ("7", "Wood Elf"),
    ("8", "Chaos"),
    ("9", "Dark Elf"),
    ("10", "Undead"),
    ("11", "Halfling"),
    ("12", "Norse"),
    ("13", "Amazon"),
    ("14", "Pro Elf"),
    ("15", "High Elf"),
    ("16", "Khemri"),
    ("17", "Necromantic"),
    ("18", "Nurgle"),
    ("19", "Ogre"),
    ("20", "Vampire"),
    ("21", "Chaos Dwarf"),
    ("22", "Underworld"),
    ("24", "Bretonnian"),
    ("25", "Kislev"),
];

/// Resolve a race id to its name.
pub fn race_name(id: &str) -> String {
    lookup(RACES, id)
}

fn lookup(table: &[(&str, &str)], id: &str) -> String {
    let id = id.trim();
    table
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| id.to_string())
}

/// Split a `(a,b,c)` skill list into its ids.
pub fn split_skills(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
