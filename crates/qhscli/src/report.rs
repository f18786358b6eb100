//! Human readable feature report

use qhs::{ControllerVersion, FeatureFlag, FeatureSupport};

const FLAGS_PER_LINE: usize = 4;
const INDENT: &str = "    ";

/// How feature states are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Render a label green/red (or grey when unknown), or with a +/-/?
    /// prefix when colors are off
    pub fn paint(self, label: &str, support: FeatureSupport) -> String {
        if self.color {
            let code = match support {
                FeatureSupport::Supported => 32,
                FeatureSupport::Unsupported => 31,
                FeatureSupport::Unknown => 90,
            };
            format!("\x1b[{}m{}\x1b[39m", code, label)
        } else {
            let mark = match support {
                FeatureSupport::Supported => '+',
                FeatureSupport::Unsupported => '-',
                FeatureSupport::Unknown => '?',
            };
            format!("{}{}", mark, label)
        }
    }
}

pub fn version_summary(version: &ControllerVersion) -> String {
    let hci = version.hci_version_name().unwrap_or("unknown");
    let lmp = version.lmp_version_name().unwrap_or("unknown");

    format!(
        "HCI version {} (0x{:x}), revision 0x{:x}\n\
         LMP version {} (0x{:x}), subversion 0x{:x}\n\
         Manufacturer is {} (0x{:x})\n\
         QTI vendor commands {}",
        hci,
        version.hci_version,
        version.hci_revision,
        lmp,
        version.lmp_version,
        version.lmp_subversion,
        version.manufacturer_name(),
        version.manufacturer,
        if version.is_qti_controller() {
            "*should* be supported"
        } else {
            "are definitely not supported"
        }
    )
}

/// Indented, comma separated flag list, a few flags per line
pub fn feature_lines<I, S>(flags: I, style: Style) -> String
where
    I: IntoIterator<Item = (FeatureFlag, S)>,
    S: Into<FeatureSupport>,
{
    let painted: Vec<String> = flags
        .into_iter()
        .map(|(flag, support)| style.paint(flag.label, support.into()))
        .collect();

    painted
        .chunks(FLAGS_PER_LINE)
        .map(|line| format!("{}{}", INDENT, line.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}
