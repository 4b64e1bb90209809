#![forbid(unsafe_code)]

//! Attention-grabbing variants built on [`Renderer::log`].

use std::error::Error;

use logsugar_text::{Color, colorize};

use crate::breadcrumb::CallSite;
use crate::config::Config;
use crate::error::Result;
use crate::render::Renderer;

/// Heaviest divider weight; anything above is clamped.
pub const MAX_DIVIDER_WEIGHT: u8 = 5;

const WTF_COLORED_DEFAULT: &str = "        WTF        ";
const WTF_PLAIN_DEFAULT: &str = "WTF";
const WTF_BANGS: &str = "!!!!!!!!!!!!!!!!";

/// Colorize only when the config asks for colors.
fn paint(config: &Config, text: &str, colors: &[Color]) -> String {
    if config.colors_enabled() {
        colorize(text, colors)
    } else {
        text.to_string()
    }
}

/// Rule segment and its color for a divider weight.
fn divider_rule(weight: u8, colored: bool) -> (&'static str, &'static [Color]) {
    const PLAIN: &[Color] = &[];
    match weight {
        0 => ("      ", PLAIN),
        1 => (".     ", PLAIN),
        2 => ("- - - ", PLAIN),
        3 => ("\u{2014}\u{2014}\u{2014}\u{2014}\u{2014}\u{2014}", &[Color::Yellow] as &[Color]),
        4 if colored => ("      ", &[Color::WhiteBg] as &[Color]),
        4 => ("\u{2584}\u{2584}\u{2584}\u{2584}\u{2584}\u{2584}", PLAIN),
        _ if colored => ("      ", &[Color::BrightYellowBg] as &[Color]),
        _ => ("\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}", PLAIN),
    }
}

fn divider_label(config: &Config, message: &str, weight: u8) -> String {
    match weight {
        0 => format!(". {message} ."),
        1 => format!("\u{25C1} {message} \u{25B7}     "),
        2 => format!("\u{25C0} {message} \u{25B6}"),
        3 => paint(config, &format!("\u{25C0} {message} \u{25B6}"), &[Color::Yellow]),
        4 => paint(config, &format!("  {message}  "), &[Color::BrightYellow]),
        _ => paint(
            config,
            &format!("  {message}  "),
            &[Color::BrightYellowBg, Color::BrightBlack],
        ),
    }
}

/// Payload of a divider row: three rule segments, the label, ten more.
pub(crate) fn divider_payload(config: &Config, message: Option<&str>, weight: u8) -> String {
    let weight = weight.min(MAX_DIVIDER_WEIGHT);
    let (rule, colors) = divider_rule(weight, config.colors_enabled());
    let pre = paint(config, &rule.repeat(3), colors);
    let post = paint(config, &rule.repeat(10), colors);
    let label = message.map_or_else(String::new, |m| divider_label(config, m, weight));
    format!("{pre}{label}{post}")
}

impl Renderer {
    /// Log something that should never happen, loudly.
    ///
    /// With colors on this is a single row on a red background. Without
    /// colors the message is framed by bangs with a blank row either side.
    ///
    /// # Errors
    ///
    /// Same as [`Renderer::log`].
    pub fn log_wtf(&self, header: Option<&str>, details: Option<&str>, site: &CallSite) -> Result<()> {
        let config = self.config();
        if config.colors_enabled() {
            let details = details.unwrap_or(WTF_COLORED_DEFAULT);
            let payload = colorize(details, &[Color::RedBg, Color::BrightBlack]);
            self.log(header, &payload, site)
        } else {
            let details = details.unwrap_or(WTF_PLAIN_DEFAULT);
            self.log(header, "", site)?;
            self.log(header, &format!("{WTF_BANGS} {details} {WTF_BANGS}"), site)?;
            self.log(header, "", site)
        }
    }

    /// Log a horizontal rule, optionally labelled.
    ///
    /// `weight` runs from 0 (barely there) to [`MAX_DIVIDER_WEIGHT`]
    /// (solid block); larger values are clamped.
    ///
    /// # Errors
    ///
    /// Same as [`Renderer::log`].
    pub fn log_divider(&self, message: Option<&str>, weight: u8, site: &CallSite) -> Result<()> {
        let payload = divider_payload(&self.config(), message, weight);
        self.log(None, &payload, site)
    }

    /// Log an error and its `source()` chain.
    ///
    /// The first line is the error itself (bright red when colored); each
    /// cause follows on its own line.
    ///
    /// # Errors
    ///
    /// Same as [`Renderer::log`].
    pub fn log_error(
        &self,
        header: Option<&str>,
        error: &(dyn Error + 'static),
        site: &CallSite,
    ) -> Result<()> {
        let config = self.config();
        let mut lines = vec![paint(&config, &error.to_string(), &[Color::BrightRed])];
        let mut source = error.source();
        while let Some(cause) = source {
            lines.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        self.log_lines(header, lines, site)
    }
}
