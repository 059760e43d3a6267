//! Data components carried in a kGetDataResp datagram and the decoded sample.

use std::fmt;

/// Component id of the heading (yaw) angle.
pub const HEADING_ID: u8 = 5;
/// Component id of the pitch angle.
pub const PITCH_ID: u8 = 24;
/// Component id of the roll angle.
pub const ROLL_ID: u8 = 25;
/// Component id of the heading status byte.
pub const HEADING_STATUS_ID: u8 = 79;

/// Attitude axis, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Pitch,
    Yaw,
    Roll,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Pitch, Axis::Yaw, Axis::Roll];

    pub fn name(self) -> &'static str {
        match self {
            Axis::Pitch => "pitch",
            Axis::Yaw => "yaw",
            Axis::Roll => "roll",
        }
    }

    /// Whether `degrees` lies in the range the sensor reports for this axis:
    /// heading `[0, 360)`, pitch `[-90, 90]`, roll `[-180, 180]`.
    pub fn in_range(self, degrees: f32) -> bool {
        match self {
            Axis::Yaw => (0.0..360.0).contains(&degrees),
            Axis::Pitch => (-90.0..=90.0).contains(&degrees),
            Axis::Roll => (-180.0..=180.0).contains(&degrees),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the four components the parser accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Heading,
    Pitch,
    Roll,
    HeadingStatus,
}

/// Seen-bitmask value once every component has been decoded.
pub(crate) const ALL_COMPONENTS: u8 = 0b1111;

impl Component {
    /// The requested component set, in the order the setup command lists it.
    pub const ALL: [Component; 4] = [
        Component::Heading,
        Component::Pitch,
        Component::Roll,
        Component::HeadingStatus,
    ];

    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            HEADING_ID => Some(Component::Heading),
            PITCH_ID => Some(Component::Pitch),
            ROLL_ID => Some(Component::Roll),
            HEADING_STATUS_ID => Some(Component::HeadingStatus),
            _ => None,
        }
    }

    pub const fn id(self) -> u8 {
        match self {
            Component::Heading => HEADING_ID,
            Component::Pitch => PITCH_ID,
            Component::Roll => ROLL_ID,
            Component::HeadingStatus => HEADING_STATUS_ID,
        }
    }

    /// The axis an angle component fills; `None` for the status byte.
    pub const fn axis(self) -> Option<Axis> {
        match self {
            Component::Heading => Some(Axis::Yaw),
            Component::Pitch => Some(Axis::Pitch),
            Component::Roll => Some(Axis::Roll),
            Component::HeadingStatus => None,
        }
    }

    pub(crate) const fn mask(self) -> u8 {
        match self {
            Component::Heading => 0b0001,
            Component::Pitch => 0b0010,
            Component::Roll => 0b0100,
            Component::HeadingStatus => 0b1000,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Component::Heading => "heading",
            Component::Pitch => "pitch",
            Component::Roll => "roll",
            Component::HeadingStatus => "heading status",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded attitude reading.
///
/// `heading_status` is passed through as received: 1, 2 and 3 denote
/// increasing heading uncertainty.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttitudeSample {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub heading_status: u8,
}

impl AttitudeSample {
    pub fn attitude(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Pitch => self.pitch,
            Axis::Yaw => self.yaw,
            Axis::Roll => self.roll,
        }
    }

    pub fn set_attitude(&mut self, axis: Axis, degrees: f32) {
        match axis {
            Axis::Pitch => self.pitch = degrees,
            Axis::Yaw => self.yaw = degrees,
            Axis::Roll => self.roll = degrees,
        }
    }

    /// Heading is reported as the yaw axis.
    pub fn heading(&self) -> f32 {
        self.yaw
    }
}
