//! ST7735 command set and the packed initialization scripts.
//!
//! Each script starts with a command count, followed by frames of the form
//! `opcode, len | DELAY, params..., [delay]`. When the [`DELAY`] bit is set in
//! the length byte, one extra byte after the parameters holds a delay in
//! milliseconds, where `255` stands for [`LONG_DELAY_MS`].

/// Software reset
pub const SWRESET: u8 = 0x01;
/// Sleep in
pub const SLPIN: u8 = 0x10;
/// Sleep out
pub const SLPOUT: u8 = 0x11;
/// Normal display mode on
pub const NORON: u8 = 0x13;
/// Display inversion off
pub const INVOFF: u8 = 0x20;
/// Display inversion on
pub const INVON: u8 = 0x21;
/// Display on
pub const DISPON: u8 = 0x29;
/// Column address set
pub const CASET: u8 = 0x2A;
/// Row address set
pub const RASET: u8 = 0x2B;
/// Memory write
pub const RAMWR: u8 = 0x2C;
/// Memory data access control
pub const MADCTL: u8 = 0x36;
/// Interface pixel format
pub const COLMOD: u8 = 0x3A;
/// Frame rate control, normal mode
pub const FRMCTR1: u8 = 0xB1;
/// Frame rate control, idle mode
pub const FRMCTR2: u8 = 0xB2;
/// Frame rate control, partial mode
pub const FRMCTR3: u8 = 0xB3;
/// Display inversion control
pub const INVCTR: u8 = 0xB4;
/// Power control 1
pub const PWCTR1: u8 = 0xC0;
/// Power control 2
pub const PWCTR2: u8 = 0xC1;
/// Power control 3
pub const PWCTR3: u8 = 0xC2;
/// Power control 4
pub const PWCTR4: u8 = 0xC3;
/// Power control 5
pub const PWCTR5: u8 = 0xC4;
/// VCOM control 1
pub const VMCTR1: u8 = 0xC5;
/// Positive gamma correction
pub const GMCTRP1: u8 = 0xE0;
/// Negative gamma correction
pub const GMCTRN1: u8 = 0xE1;

/// MADCTL row address order
pub const MADCTL_MY: u8 = 0x80;
/// MADCTL column address order
pub const MADCTL_MX: u8 = 0x40;
/// MADCTL row/column exchange
pub const MADCTL_MV: u8 = 0x20;
/// MADCTL RGB subpixel order
pub const MADCTL_RGB: u8 = 0x00;
/// MADCTL BGR subpixel order
pub const MADCTL_BGR: u8 = 0x08;

/// Length-byte flag announcing a trailing delay byte.
pub const DELAY: u8 = 0x80;

/// Delay used when a script frame asks for `255` ms.
pub const LONG_DELAY_MS: u16 = 500;

/// Reset, sleep out, frame rate, power and pixel format.
#[rustfmt::skip]
pub const INIT_SCRIPT_1: &[u8] = &[
    14,
    SWRESET, DELAY, 150,
    SLPOUT, DELAY, 255,
    FRMCTR1, 3, 0x01, 0x2C, 0x2D,
    FRMCTR2, 3, 0x01, 0x2C, 0x2D,
    FRMCTR3, 6, 0x01, 0x2C, 0x2D, 0x01, 0x2C, 0x2D,
    INVCTR, 1, 0x07,
    PWCTR1, 3, 0xA2, 0x02, 0x84,
    PWCTR2, 1, 0xC5,
    PWCTR3, 2, 0x0A, 0x00,
    PWCTR4, 2, 0x8A, 0x2A,
    PWCTR5, 2, 0x8A, 0xEE,
    VMCTR1, 1, 0x0E,
    INVOFF, 0,
    COLMOD, 1, 0x05,
];

/// Full 128x128 address window, shared by the 160x128 and 128x128 panels.
#[rustfmt::skip]
pub const INIT_SCRIPT_2_128: &[u8] = &[
    2,
    CASET, 4, 0x00, 0x00, 0x00, 0x7F,
    RASET, 4, 0x00, 0x00, 0x00, 0x7F,
];

/// 80x160 address window with inversion on for the IPS mini panel.
#[rustfmt::skip]
pub const INIT_SCRIPT_2_160X80: &[u8] = &[
    3,
    CASET, 4, 0x00, 0x00, 0x00, 0x4F,
    RASET, 4, 0x00, 0x00, 0x00, 0x9F,
    INVON, 0,
];

/// Gamma tables, normal mode and display on.
#[rustfmt::skip]
pub const INIT_SCRIPT_3: &[u8] = &[
    4,
    GMCTRP1, 16,
    0x02, 0x1c, 0x07, 0x12, 0x37, 0x32, 0x29, 0x2d,
    0x29, 0x25, 0x2B, 0x39, 0x00, 0x01, 0x03, 0x10,
    GMCTRN1, 16,
    0x03, 0x1d, 0x07, 0x06, 0x2E, 0x2C, 0x29, 0x2D,
    0x2E, 0x2E, 0x37, 0x3F, 0x00, 0x00, 0x02, 0x10,
    NORON, DELAY, 10,
    DISPON, DELAY, 100,
];

/// A single decoded script frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Command opcode
    pub command: u8,
    /// Parameter bytes sent after the opcode
    pub params: &'a [u8],
    /// Wait after the command, in milliseconds
    pub delay_ms: Option<u16>,
}

/// Iterator over the frames of a packed script.
///
/// A truncated script ends the iteration at the last complete frame.
#[derive(Debug, Clone)]
pub struct Script<'a> {
    bytes: &'a [u8],
    remaining: u8,
}

impl<'a> Script<'a> {
    /// Starts decoding `bytes`, whose first byte is the command count.
    pub fn new(bytes: &'a [u8]) -> Self {
        match bytes.split_first() {
            Some((&count, rest)) => Self {
                bytes: rest,
                remaining: count,
            },
            None => Self {
                bytes,
                remaining: 0,
            },
        }
    }
}

impl<'a> Iterator for Script<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let (&command, rest) = self.bytes.split_first()?;
        let (&len, rest) = rest.split_first()?;
        let count = usize::from(len & !DELAY);
        if rest.len() < count {
            self.remaining = 0;
            return None;
        }
        let (params, mut rest) = rest.split_at(count);

        let delay_ms = if len & DELAY != 0 {
            let (&ms, tail) = rest.split_first()?;
            rest = tail;
            Some(match ms {
                255 => LONG_DELAY_MS,
                ms => u16::from(ms),
            })
        } else {
            None
        };

        self.bytes = rest;
        Some(Frame {
            command,
            params,
            delay_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_script_decodes_every_frame() {
        let frames: heapless::Vec<Frame, 16> = Script::new(INIT_SCRIPT_1).collect();
        assert_eq!(frames.len(), 14);
        assert_eq!(
            frames[0],
            Frame {
                command: SWRESET,
                params: &[],
                delay_ms: Some(150)
            }
        );
        // 255 is remapped to the long delay
        assert_eq!(frames[1].delay_ms, Some(LONG_DELAY_MS));
        assert_eq!(frames[4].params, &[0x01, 0x2C, 0x2D, 0x01, 0x2C, 0x2D]);
        assert_eq!(frames[12].command, INVOFF);
        assert_eq!(frames[12].delay_ms, None);
        assert_eq!(frames[13].command, COLMOD);
        assert_eq!(frames[13].params, &[0x05]);
    }

    #[test]
    fn gamma_script_keeps_sixteen_parameters() {
        let frames: heapless::Vec<Frame, 4> = Script::new(INIT_SCRIPT_3).collect();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].command, GMCTRP1);
        assert_eq!(frames[0].params.len(), 16);
        assert_eq!(frames[1].params[15], 0x10);
        assert_eq!(frames[2].delay_ms, Some(10));
        assert_eq!(frames[3].command, DISPON);
        assert_eq!(frames[3].delay_ms, Some(100));
    }

    #[test]
    fn mini_panel_window_script_ends_with_inversion() {
        let mut script = Script::new(INIT_SCRIPT_2_160X80);
        assert_eq!(script.next().map(|f| f.params), Some(&[0x00, 0x00, 0x00, 0x4F][..]));
        assert_eq!(script.next().map(|f| f.params), Some(&[0x00, 0x00, 0x00, 0x9F][..]));
        assert_eq!(script.next().map(|f| f.command), Some(INVON));
        assert_eq!(script.next(), None);
    }

    #[test]
    fn truncated_script_stops_early() {
        let mut script = Script::new(&[3, CASET, 4, 0x00, 0x00]);
        assert_eq!(script.next(), None);
        // count larger than the frames present
        assert_eq!(Script::new(&[2, NORON, 0]).count(), 1);
        assert_eq!(Script::new(&[]).next(), None);
    }
}
