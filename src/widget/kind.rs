use serde::Serialize;
use std::fmt;

/// Classification of the value a widget carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    String,
    Number,
    Date,
    /// Window and Section widgets carry no value
    Structural,
}

impl ValueType {
    /// Short name used when reporting a widget's value type.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "int",
            ValueType::Date => "date",
            ValueType::Structural => "weird",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a configuration widget.
///
/// Discriminants follow the driver's numeric widget type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WidgetKind {
    Window = 0,
    Section = 1,
    Text = 2,
    Range = 3,
    Toggle = 4,
    Radio = 5,
    Menu = 6,
    Button = 7,
    Date = 8,
}

/// Static description of a widget kind.
#[derive(Debug)]
pub struct WidgetKindInfo {
    pub kind: WidgetKind,
    pub name: &'static str,
    pub value_type: ValueType,
    pub description: &'static str,
}

static WIDGET_KINDS: [WidgetKindInfo; 9] = [
    WidgetKindInfo {
        kind: WidgetKind::Window,
        name: "Window",
        value_type: ValueType::Structural,
        description: "Top level configuration widget holding the section widgets",
    },
    WidgetKindInfo {
        kind: WidgetKind::Section,
        name: "Section",
        value_type: ValueType::Structural,
        description: "Section widget (think tab)",
    },
    WidgetKindInfo {
        kind: WidgetKind::Text,
        name: "Text",
        value_type: ValueType::String,
        description: "Text widget",
    },
    WidgetKindInfo {
        kind: WidgetKind::Range,
        name: "Range",
        value_type: ValueType::Number,
        description: "Slider widget",
    },
    WidgetKindInfo {
        kind: WidgetKind::Toggle,
        name: "Toggle",
        value_type: ValueType::Number,
        description: "Toggle widget (think check box)",
    },
    WidgetKindInfo {
        kind: WidgetKind::Radio,
        name: "Radio",
        value_type: ValueType::String,
        description: "Radio button widget",
    },
    WidgetKindInfo {
        kind: WidgetKind::Menu,
        name: "Menu",
        value_type: ValueType::Number,
        description: "Menu widget (same as radio)",
    },
    WidgetKindInfo {
        kind: WidgetKind::Button,
        name: "Button",
        value_type: ValueType::Number,
        description: "Button press widget",
    },
    WidgetKindInfo {
        kind: WidgetKind::Date,
        name: "Date",
        value_type: ValueType::Date,
        description: "Date entering widget",
    },
];

impl WidgetKind {
    pub const ALL: [WidgetKind; 9] = [
        WidgetKind::Window,
        WidgetKind::Section,
        WidgetKind::Text,
        WidgetKind::Range,
        WidgetKind::Toggle,
        WidgetKind::Radio,
        WidgetKind::Menu,
        WidgetKind::Button,
        WidgetKind::Date,
    ];

    pub fn info(self) -> &'static WidgetKindInfo {
        &WIDGET_KINDS[self as usize]
    }

    pub fn value_type(self) -> ValueType {
        self.info().value_type
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn description(self) -> &'static str {
        self.info().description
    }

    /// Window and Section widgets may hold children.
    pub fn is_container(self) -> bool {
        self.value_type() == ValueType::Structural
    }

    /// Map a driver widget type code to a kind.
    pub fn from_raw(raw: i32) -> Option<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(|index| WidgetKind::ALL.get(index).copied())
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
