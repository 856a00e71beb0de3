use std::fmt;

/// Console model of the Vantage family.
///
/// Models differ only in which operations their firmware answers:
/// the Vue adds the firmware-version query over the original Pro, and the
/// Pro 2 additionally speaks LOOP2 (and therefore supports the rich
/// realtime merge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    VantagePro,
    VantagePro2,
    VantageVue,
}

impl Model {
    /// Whether the firmware answers `NVER`.
    pub fn has_firmware_version(self) -> bool {
        !matches!(self, Model::VantagePro)
    }

    /// Whether the console speaks LOOP2 (and can serve rich realtime data).
    pub fn has_loop2(self) -> bool {
        matches!(self, Model::VantagePro2)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Model::VantagePro => "Vantage Pro",
            Model::VantagePro2 => "Vantage Pro 2",
            Model::VantageVue => "Vantage Vue",
        })
    }
}
