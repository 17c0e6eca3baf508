use std::path::{Path, PathBuf};

/// Supported handheld firmware layouts.
///
/// Each layout has its own conventions for where ROMs, saves and BIOS files
/// live on the SD card, and for how platform folders are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceLayout {
    MuOs,
    NextUi,
    Knulli,
}

/// How a layout names its per-platform ROM folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderGrouping {
    /// One folder per platform, named straight from the layout table.
    Direct,
    /// Folders named like `Game Boy Advance (GBA)`; the parenthesised tag
    /// identifies the platform, and several tags may map to one platform.
    TagGrouped,
}

const ALL_LAYOUTS: &[DeviceLayout] = &[
    DeviceLayout::MuOs,
    DeviceLayout::NextUi,
    DeviceLayout::Knulli,
];

pub const MUOS_SD1: &str = "/mnt/mmc";
pub const MUOS_SD2: &str = "/mnt/sdcard";
pub const MUOS_ROMS_UNION: &str = "/mnt/union/ROMS";

type SlugTable = &'static [(&'static str, &'static [&'static str])];

const MUOS_PLATFORMS: SlugTable = &[
    ("gb", &["Nintendo Game Boy"]),
    ("gbc", &["Nintendo Game Boy Color"]),
    ("gba", &["Nintendo Game Boy Advance"]),
    ("nes", &["Nintendo NES-Famicom"]),
    ("famicom", &["Nintendo NES-Famicom"]),
    ("snes", &["Nintendo SNES-SFC"]),
    ("sfam", &["Nintendo SNES-SFC"]),
    ("n64", &["Nintendo N64"]),
    ("nds", &["Nintendo DS"]),
    ("genesis", &["Sega Mega Drive - Genesis"]),
    ("sms", &["Sega Master System"]),
    ("gamegear", &["Sega Game Gear"]),
    ("segacd", &["Sega Mega CD - Sega CD"]),
    ("psx", &["Sony PlayStation"]),
    ("psp", &["Sony PlayStation Portable"]),
    ("tg16", &["NEC PC Engine"]),
    ("neogeo", &["SNK Neo Geo"]),
    ("arcade", &["Arcade"]),
];

const MUOS_SAVES: SlugTable = &[
    ("gb", &["Gambatte", "Gearboy", "SameBoy"]),
    ("gbc", &["Gambatte", "Gearboy", "SameBoy"]),
    ("gba", &["mGBA", "gpSP", "VBA-M"]),
    ("nes", &["FCEUmm", "Nestopia", "Mesen"]),
    ("famicom", &["FCEUmm", "Nestopia", "Mesen"]),
    ("snes", &["Snes9x", "bsnes"]),
    ("sfam", &["Snes9x", "bsnes"]),
    ("n64", &["Mupen64Plus-Next", "ParaLLEl N64"]),
    ("nds", &["DeSmuME", "melonDS"]),
    ("genesis", &["Genesis Plus GX", "PicoDrive"]),
    ("sms", &["Genesis Plus GX", "PicoDrive"]),
    ("gamegear", &["Genesis Plus GX"]),
    ("segacd", &["Genesis Plus GX", "PicoDrive"]),
    ("psx", &["PCSX-ReARMed", "SwanStation"]),
    ("psp", &["PPSSPP"]),
    ("tg16", &["Beetle PCE Fast"]),
    ("neogeo", &["FinalBurn Neo"]),
    ("arcade", &["FinalBurn Neo", "MAME 2003-Plus"]),
];

const NEXTUI_PLATFORMS: SlugTable = &[
    ("gb", &["Game Boy (GB)"]),
    ("gbc", &["Game Boy Color (GBC)"]),
    ("gba", &["Game Boy Advance (GBA)", "Game Boy Advance (MGBA)"]),
    ("nes", &["Nintendo Entertainment System (FC)"]),
    ("famicom", &["Nintendo Entertainment System (FC)"]),
    ("fds", &["Famicom Disk System (FDS)"]),
    ("snes", &["Super Nintendo Entertainment System (SFC)"]),
    ("sfam", &["Super Nintendo Entertainment System (SFC)"]),
    ("n64", &["Nintendo 64 (N64)"]),
    ("genesis", &["Sega Genesis (MD)"]),
    ("sms", &["Sega Master System (SMS)"]),
    ("gamegear", &["Sega Game Gear (GG)"]),
    ("segacd", &["Sega CD (SEGACD)"]),
    ("psx", &["Sony PlayStation (PS)"]),
    ("tg16", &["TurboGrafx-16 (PCE)"]),
    ("pokemon-mini", &["Pokemon mini (PKM)"]),
    ("arcade", &["Arcade (FBN)"]),
];

const NEXTUI_SAVES: SlugTable = &[
    ("gb", &["GB"]),
    ("gbc", &["GBC"]),
    ("gba", &["GBA", "MGBA"]),
    ("nes", &["FC"]),
    ("famicom", &["FC"]),
    ("fds", &["FDS"]),
    ("snes", &["SFC"]),
    ("sfam", &["SFC"]),
    ("n64", &["N64"]),
    ("genesis", &["MD"]),
    ("sms", &["SMS"]),
    ("gamegear", &["GG"]),
    ("segacd", &["SEGACD"]),
    ("psx", &["PS"]),
    ("tg16", &["PCE"]),
    ("pokemon-mini", &["PKM"]),
    ("arcade", &["FBN"]),
];

const KNULLI_PLATFORMS: SlugTable = &[
    ("gb", &["gb"]),
    ("gbc", &["gbc"]),
    ("gba", &["gba"]),
    ("nes", &["nes"]),
    ("famicom", &["famicom", "nes"]),
    ("fds", &["fds"]),
    ("snes", &["snes"]),
    ("sfam", &["sfc", "snes"]),
    ("n64", &["n64"]),
    ("nds", &["nds"]),
    ("genesis", &["megadrive", "genesis"]),
    ("sms", &["mastersystem"]),
    ("gamegear", &["gamegear"]),
    ("segacd", &["segacd"]),
    ("psx", &["psx"]),
    ("psp", &["psp"]),
    ("tg16", &["pcengine"]),
    ("neogeo", &["neogeo"]),
    ("arcade", &["fbneo", "mame"]),
];

impl DeviceLayout {
    /// Canonical lowercase name, accepted by `FromStr` and the `CFW` variable.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::MuOs => "muos",
            Self::NextUi => "nextui",
            Self::Knulli => "knulli",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MuOs => "muOS",
            Self::NextUi => "NextUI",
            Self::Knulli => "Knulli",
        }
    }

    pub fn all() -> &'static [DeviceLayout] {
        ALL_LAYOUTS
    }

    pub fn grouping(&self) -> FolderGrouping {
        match self {
            Self::NextUi => FolderGrouping::TagGrouped,
            Self::MuOs | Self::Knulli => FolderGrouping::Direct,
        }
    }

    /// Environment variable that overrides the SD card base path.
    pub fn base_path_env(&self) -> &'static str {
        match self {
            Self::MuOs => "MUOS_BASE_PATH",
            Self::NextUi => "NEXTUI_BASE_PATH",
            Self::Knulli => "KNULLI_BASE_PATH",
        }
    }

    /// Base path used when neither config nor environment sets one.
    ///
    /// muOS picks between its two SD slots at runtime, so this returns the
    /// primary slot; callers probe `MUOS_SD2` themselves.
    pub fn default_base_path(&self) -> &'static str {
        match self {
            Self::MuOs => MUOS_SD1,
            Self::NextUi => "/mnt/SDCARD",
            Self::Knulli => "/userdata",
        }
    }

    /// Root folder holding every platform's ROM folder.
    pub fn rom_root(&self, base: &Path) -> PathBuf {
        match self {
            Self::MuOs => PathBuf::from(MUOS_ROMS_UNION),
            Self::NextUi => base.join("Roms"),
            Self::Knulli => base.join("roms"),
        }
    }

    /// Root folder under which per-platform save folders live.
    pub fn save_root(&self, base: &Path) -> PathBuf {
        match self {
            Self::MuOs => base.join("MUOS").join("save").join("file"),
            Self::NextUi => base.join("Saves"),
            Self::Knulli => base.join("saves"),
        }
    }

    /// Directories that may hold BIOS files for a platform, most specific first.
    pub fn bios_dirs(&self, base: &Path, platform_slug: &str) -> Vec<PathBuf> {
        match self {
            Self::MuOs => vec![base.join("MUOS").join("bios")],
            Self::NextUi => {
                let bios = base.join("Bios");
                let mut dirs: Vec<PathBuf> = self
                    .platform_tags(platform_slug)
                    .into_iter()
                    .map(|tag| bios.join(tag))
                    .collect();
                dirs.push(bios);
                dirs
            }
            Self::Knulli => vec![base.join("bios")],
        }
    }

    /// Folder names this layout uses for a platform's ROMs.
    pub fn platform_dirs(&self, platform_slug: &str) -> &'static [&'static str] {
        lookup(self.platform_table(), platform_slug)
    }

    /// Folder names (relative to `save_root`) this layout uses for a platform's saves.
    pub fn save_dirs(&self, platform_slug: &str) -> &'static [&'static str] {
        lookup(self.save_table(), platform_slug)
    }

    /// Folder name new downloads for a platform go into: the first table
    /// entry, or the lowercased slug for platforms the table does not know.
    pub fn default_platform_dir(&self, platform_slug: &str) -> String {
        match self.platform_dirs(platform_slug).first() {
            Some(dir) => (*dir).to_string(),
            None => platform_slug.to_lowercase(),
        }
    }

    /// Tags identifying a platform's folders in a tag-grouped layout.
    ///
    /// Empty for direct layouts.
    pub fn platform_tags(&self, platform_slug: &str) -> Vec<&'static str> {
        if self.grouping() != FolderGrouping::TagGrouped {
            return Vec::new();
        }
        let mut tags = Vec::new();
        for tag in self.platform_dirs(platform_slug).iter().filter_map(|d| parse_tag(d)) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Every platform slug this layout has a folder for, in table order.
    pub fn platform_slugs(&self) -> impl Iterator<Item = &'static str> {
        self.platform_table().iter().map(|(slug, _)| *slug)
    }

    fn platform_table(&self) -> SlugTable {
        match self {
            Self::MuOs => MUOS_PLATFORMS,
            Self::NextUi => NEXTUI_PLATFORMS,
            Self::Knulli => KNULLI_PLATFORMS,
        }
    }

    fn save_table(&self) -> SlugTable {
        match self {
            Self::MuOs => MUOS_SAVES,
            Self::NextUi => NEXTUI_SAVES,
            Self::Knulli => KNULLI_PLATFORMS,
        }
    }
}

fn lookup(table: SlugTable, slug: &str) -> &'static [&'static str] {
    table
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, dirs)| *dirs)
        .unwrap_or(&[])
}

/// Extract the tag from a folder name like `Game Boy Advance (GBA)`.
///
/// The tag is the text inside the last pair of parentheses. Returns `None`
/// when there is no non-empty parenthesised suffix.
pub fn parse_tag(dir_name: &str) -> Option<&str> {
    let trimmed = dir_name.trim_end();
    let inner = trimmed.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let tag = inner[open + 1..].trim();
    if tag.is_empty() { None } else { Some(tag) }
}

impl std::fmt::Display for DeviceLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Error returned when a string cannot be parsed into a `DeviceLayout`.
#[derive(Debug, Clone)]
pub struct LayoutParseError(pub String);

impl std::fmt::Display for LayoutParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported layout '{}' (valid options: muOS, NextUI, Knulli)",
            self.0
        )
    }
}

impl std::error::Error for LayoutParseError {}

impl std::str::FromStr for DeviceLayout {
    type Err = LayoutParseError;

    /// Parse a layout name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        for &layout in ALL_LAYOUTS {
            if layout.short_name() == lower {
                return Ok(layout);
            }
        }
        Err(LayoutParseError(s.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/layout_tests.rs"]
mod tests;
