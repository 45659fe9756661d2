//! # Troubleshooting guide
//!
//! This guide lists common issues that can cause a blank, shifted or corrupted display.
//!
//! ## Display stays black/blank
//!
//! ### Reset pin
//!
//! The ST7735 reset pin is active low, requiring it to be driven **high** in
//! order for the display to operate. It is recommended to connect the reset pin
//! to a GPIO pin and let this crate control the pin by passing it to the builder
//! via the `reset_pin` method. If this isn't possible in the target application
//! the user must make sure that the reset pin is kept in the high state before
//! `init` is called. The init sequence starts with a software reset in either case.
//!
//! ### Backlight pin
//!
//! This driver does **NOT** handle the backlight pin to keep the code simpler.
//! Users must control the backlight manually. First thing to try is to see if
//! setting the backlight pin to high fixes the issue.
//!
//! ### Transport misconfiguration (e.g. SPI)
//!
//! Make sure that the transport layer is configured correctly. The ST7735 uses
//! SPI mode 0 and most modules stop working reliably above 15-20 MHz.
//!
//! ### Pixels never arrive
//!
//! [`SpiInterface`](crate::interface::SpiInterface) writes a lent buffer when the
//! transfer is awaited, and every drawing operation waits for its last transfer
//! before returning. A custom DMA [`Interface`](crate::interface::Interface) that
//! only makes progress while it is polled must return `true` from
//! [`is_deferred`](crate::interface::Interface::is_deferred), otherwise the last
//! buffer of a drawing operation stays queued until the next command.
//!
//! ## Image is shifted or has a garbage border
//!
//! The three supported panels place their visible area at different offsets in
//! the controller RAM. A 1.44" 128x128 module driven as
//! [`Tft160x128`](crate::options::PanelVariant::Tft160x128) shows a stripe of
//! random pixels along two edges, and a 0.96" 80x160 module driven as anything
//! but [`Tft160x80`](crate::options::PanelVariant::Tft160x80) is shifted by 24
//! columns. Pick the variant that matches the module.
//!
//! ## Incorrect colors
//!
//! The 80x160 IPS panels need color inversion and BGR subpixel order, which the
//! [`Tft160x80`](crate::options::PanelVariant::Tft160x80) variant sets up. Some
//! modules are sold with a different glass, so if black shows up as white the
//! inversion can be overridden on the builder:
//!
//! ```
//! use st7735_dma::{Builder, Buffers, options::PanelVariant};
//!
//! # tokio_test::block_on(async {
//! # let mut buffer = [0u8; 64];
//! # let di = st7735_dma::_mock::MockInterface::new();
//! # let delay = st7735_dma::_mock::MockDelay::default();
//! let mut display = Builder::new(PanelVariant::Tft160x80, di, Buffers::Single(&mut buffer))
//!     .invert_colors(false)
//!     .init(delay)
//!     .await
//!     .unwrap();
//! assert!(!display.is_inverted());
//! # });
//! ```
//!
//! Colors are plain RGB565 values. Use [`color::rgb565`](crate::color::rgb565)
//! to pack 8 bit channels instead of writing the bits by hand, red ends up in
//! the top five bits.
//!
//! ## Drawing is slow or stutters
//!
//! Check [`Display::stalls`](crate::Display::stalls). Every stall means a transfer
//! did not complete within the stall timeout and was abandoned, which usually
//! points at a DMA completion interrupt that is not wired up. Enable the `defmt`
//! feature to get a warning for each one. Raising the timeout with
//! [`Builder::stall_timeout_us`](crate::Builder::stall_timeout_us) only helps if
//! the transfers are genuinely slower than the default of 100 ms.
//!
//! ```
//! use st7735_dma::{Builder, Buffers, color, options::PanelVariant};
//!
//! # tokio_test::block_on(async {
//! # let mut front = [0u8; 64];
//! # let mut back = [0u8; 64];
//! # let di = st7735_dma::_mock::MockInterface::new();
//! # let delay = st7735_dma::_mock::MockDelay::default();
//! let mut display = Builder::new(
//!     PanelVariant::Tft128x128,
//!     di,
//!     Buffers::Double(&mut front, &mut back),
//! )
//! .stall_timeout_us(250_000)
//! .init(delay)
//! .await
//! .unwrap();
//!
//! display.fill_screen(color::BLUE).await.unwrap();
//! display.wait_idle().await.unwrap();
//! assert_eq!(display.stalls(), 0);
//! # });
//! ```
//!
//! Larger buffers mean fewer transfers per operation. With
//! [`Buffers::Double`](crate::Buffers::Double) the next buffer is filled while
//! the previous one is on the wire, which only pays off with an interface that
//! transfers in the background.
