//! [super::Display] configuration options

use crate::dcs;

/// Supported ST7735 panel variants.
///
/// The variant fixes the visible resolution, the offset of the visible area
/// inside the controller RAM and the window part of the init sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelVariant {
    /// 1.8" 128x160 panel
    Tft160x128,
    /// 1.44" 128x128 panel, visible area shifted by (2, 3)
    Tft128x128,
    /// 0.96" 80x160 IPS panel, visible area shifted by 24 columns
    Tft160x80,
}

impl PanelVariant {
    /// Width and height in the default (unrotated) orientation.
    pub const fn native_size(self) -> (u16, u16) {
        match self {
            Self::Tft160x128 => (128, 160),
            Self::Tft128x128 => (128, 128),
            Self::Tft160x80 => (80, 160),
        }
    }

    /// Column and row start of the visible area in the default orientation.
    pub const fn ram_offset(self) -> (u16, u16) {
        match self {
            Self::Tft160x128 => (0, 0),
            Self::Tft128x128 => (2, 3),
            Self::Tft160x80 => (24, 0),
        }
    }

    /// Subpixel order bit for MADCTL.
    pub const fn color_order(self) -> u8 {
        match self {
            Self::Tft160x80 => dcs::MADCTL_BGR,
            _ => dcs::MADCTL_RGB,
        }
    }

    pub(crate) const fn window_script(self) -> &'static [u8] {
        match self {
            Self::Tft160x80 => dcs::INIT_SCRIPT_2_160X80,
            _ => dcs::INIT_SCRIPT_2_128,
        }
    }

    /// MADCTL value sent once after the init scripts, before rotation is applied.
    pub(crate) const fn initial_madctl(self) -> Option<u8> {
        match self {
            Self::Tft160x80 => Some(dcs::MADCTL_MX | dcs::MADCTL_MY),
            _ => None,
        }
    }
}

/// Display rotation, counted clockwise in 90 degree steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// No rotation
    #[default]
    Deg0,
    /// 90 degree rotation
    Deg90,
    /// 180 degree rotation
    Deg180,
    /// 270 degree rotation
    Deg270,
}

impl Rotation {
    /// Returns the rotation for `index`, taken modulo 4.
    pub const fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    /// Returns the rotation index in `0..4`.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Returns `true` if rows and columns are exchanged.
    pub const fn is_transposed(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// MADCTL value for this rotation with the given subpixel order bit.
    pub const fn madctl(self, color_order: u8) -> u8 {
        let bits = match self {
            Self::Deg0 => dcs::MADCTL_MX | dcs::MADCTL_MY,
            Self::Deg90 => dcs::MADCTL_MY | dcs::MADCTL_MV,
            Self::Deg180 => 0,
            Self::Deg270 => dcs::MADCTL_MX | dcs::MADCTL_MV,
        };
        bits | color_order
    }
}

impl From<u8> for Rotation {
    fn from(index: u8) -> Self {
        Self::from_index(index)
    }
}

/// Effective panel geometry for the current rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
    /// Visible width in pixels
    pub width: u16,
    /// Visible height in pixels
    pub height: u16,
    /// Offset added to every column address
    pub x_start: u16,
    /// Offset added to every row address
    pub y_start: u16,
    /// Rotation the geometry was derived for
    pub rotation: Rotation,
}

impl Geometry {
    /// Computes the geometry of `variant` rotated by `rotation`.
    pub const fn new(variant: PanelVariant, rotation: Rotation) -> Self {
        let (width, height) = variant.native_size();
        let (col_start, row_start) = variant.ram_offset();
        if rotation.is_transposed() {
            Self {
                width: height,
                height: width,
                x_start: row_start,
                y_start: col_start,
                rotation,
            }
        } else {
            Self {
                width,
                height,
                x_start: col_start,
                y_start: row_start,
                rotation,
            }
        }
    }

    /// Clips a rectangle against the visible area.
    ///
    /// Returns `None` if nothing of the rectangle is visible.
    pub fn clip(&self, x: u16, y: u16, width: u16, height: u16) -> Option<Area> {
        if x >= self.width || y >= self.height || width == 0 || height == 0 {
            return None;
        }
        Some(Area {
            x,
            y,
            width: width.min(self.width - x),
            height: height.min(self.height - y),
        })
    }
}

/// A visible rectangle in panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Area {
    /// Left column
    pub x: u16,
    /// Top row
    pub y: u16,
    /// Width in pixels, never zero
    pub width: u16,
    /// Height in pixels, never zero
    pub height: u16,
}

impl Area {
    /// Last column, inclusive.
    pub const fn x_end(&self) -> u16 {
        self.x + self.width - 1
    }

    /// Last row, inclusive.
    pub const fn y_end(&self) -> u16 {
        self.y + self.height - 1
    }

    /// Number of pixels in the area.
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Default bound for a single transfer before it is considered stalled.
pub const DEFAULT_STALL_TIMEOUT_US: u32 = 100_000;

/// [`Display`](crate::Display) options set through the [`Builder`](crate::Builder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayOptions {
    /// Panel variant
    pub variant: PanelVariant,
    /// Initial rotation
    pub rotation: Rotation,
    /// Inversion applied after the init scripts, `None` keeps the variant default
    pub invert_colors: Option<bool>,
    /// Bound for a single transfer, in microseconds
    pub stall_timeout_us: u32,
}

impl DisplayOptions {
    /// Default options for `variant`.
    pub const fn new(variant: PanelVariant) -> Self {
        Self {
            variant,
            rotation: Rotation::Deg0,
            invert_colors: None,
            stall_timeout_us: DEFAULT_STALL_TIMEOUT_US,
        }
    }
}
