//! OLED rendering for workflow screens
//! Using embedded-graphics, so the same code draws to the SH1106 and to an in-memory frame

use crate::nutrition::FoodGroup;
use crate::types::{Processing, ANIMATION_SLICE_MS};
use crate::workflow::events::{Action, ErrorHint, Screen};
use embassy_time::{Duration, Timer};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, ascii::FONT_9X15, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use log::debug;
use std::fmt::Debug;
use thiserror::Error;

pub const DISPLAY_WIDTH: u32 = 128;
pub const DISPLAY_HEIGHT: u32 = 64;

const HEADER_HEIGHT: u32 = 12;
const CHARS_PER_LINE: usize = 21;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Display init failed: {0}")]
    Init(String),
    #[error("Display draw error: {0}")]
    Draw(String),
    #[error("Display flush failed: {0}")]
    Flush(String),
}

/// Whether a render ran to the end or stopped early because new input arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed,
    Interrupted,
}

/// A monochrome draw target with a frame to push.
pub trait Panel: DrawTarget<Color = BinaryColor> {
    fn clear_panel(&mut self);
    fn flush_panel(&mut self) -> Result<(), DisplayError>;
}

#[allow(async_fn_in_trait)]
pub trait Renderer {
    /// Draws `screen`. Animated screens poll `interrupted` after every slice and return
    /// early when it reports pending input.
    async fn render(
        &mut self,
        screen: &Screen,
        interrupted: &dyn Fn() -> bool,
    ) -> Result<RenderOutcome, DisplayError>;
}

pub struct OledRenderer<P> {
    panel: P,
    slice: Duration,
}

impl<P> OledRenderer<P>
where
    P: Panel,
    P::Error: Debug,
{
    pub fn new(panel: P) -> Self {
        Self::with_slice(panel, Duration::from_millis(ANIMATION_SLICE_MS))
    }

    pub fn with_slice(panel: P, slice: Duration) -> Self {
        Self { panel, slice }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn into_inner(self) -> P {
        self.panel
    }

    pub fn show_boot_screen(&mut self) -> Result<(), DisplayError> {
        self.panel.clear_panel();
        self.large("Nutri Scale", 10, 20)?;
        self.text("Starting...", 30, 42)?;
        self.panel.flush_panel()
    }

    fn frame(&mut self, screen: &Screen, frame: u32, frames: u32) -> Result<(), DisplayError> {
        self.panel.clear_panel();
        self.draw_screen(screen, frame, frames)?;
        self.panel.flush_panel()
    }

    fn draw_screen(&mut self, screen: &Screen, frame: u32, frames: u32) -> Result<(), DisplayError> {
        match screen {
            Screen::Dashboard {
                last_meal,
                last_meal_dishes,
                day,
                meals_today,
                just_saved,
            } => {
                self.header(if *just_saved { "Meal saved" } else { "Last meal" }, true)?;
                self.text(
                    &format!("{:.0} kcal  {} dishes", last_meal.kcal, last_meal_dishes),
                    0,
                    15,
                )?;
                let r = last_meal.rations();
                self.text(&format!("C {:.1} P {:.1} F {:.1}", r.carb, r.protein, r.fat), 0, 27)?;
                self.text(&format!("Today {:.0} kcal", day.kcal), 0, 41)?;
                self.text(&format!("{} meals", meals_today), 0, 53)?;
            }
            Screen::ChooseGroup { container_g } => {
                self.header("Container", true)?;
                self.large(&format!("{:.0} g", container_g), 0, 18)?;
                self.text("Choose a food group", 0, 46)?;
            }
            Screen::GroupExamples {
                group,
                needs_processing,
            } => {
                self.group_header(group)?;
                let mut y = 15;
                for line in wrap(group.examples, CHARS_PER_LINE).iter().take(3) {
                    self.text(line, 0, y)?;
                    y += 10;
                }
                let prompt = if *needs_processing {
                    "Raw or cooked?"
                } else {
                    "Place the food"
                };
                self.text(prompt, 0, 53)?;
            }
            Screen::ProcessingChosen { group, processing } => {
                self.group_header(group)?;
                let label = match processing {
                    Processing::Cooked => "COOKED",
                    Processing::Raw => "RAW",
                    Processing::None => "",
                };
                self.large(label, 0, 20)?;
                self.text("Place the food", 0, 46)?;
            }
            Screen::Weighing {
                group,
                item,
                dish,
                meal,
            } => {
                self.group_header(group)?;
                self.large(&format!("{:.0} g", item.weight_g), 0, 15)?;
                self.text(&format!("{:.0} kcal", item.kcal), 80, 18)?;
                self.text(&format!("Dish {:.0} kcal", dish.kcal), 0, 40)?;
                self.text(&format!("Meal {:.0} kcal", meal.kcal), 0, 52)?;
            }
            Screen::Confirm(action) => {
                self.header("Confirm", true)?;
                self.large(question(*action), 0, 20)?;
                self.text("Press again to confirm", 0, 48)?;
            }
            Screen::ActionDone {
                action,
                meal,
                dishes,
            } => {
                self.header(done(*action), true)?;
                self.text(&format!("Meal {:.0} kcal", meal.kcal), 0, 18)?;
                self.text(&format!("{} dishes", dishes), 0, 30)?;
                self.progress(frame, frames)?;
            }
            Screen::Error(hint) => {
                // Header blinks
                self.header("ERROR", frame % 2 == 0)?;
                self.lines(hint_text(*hint), 18)?;
            }
            Screen::Cancelled => {
                self.header("Cancelled", true)?;
                self.text("Nothing was changed", 0, 30)?;
            }
            Screen::Warning(action) => {
                self.header("Warning", frame % 2 == 0)?;
                self.lines(nothing_to(*action), 24)?;
            }
            Screen::LedgerResetConfirm => {
                self.header("Reset today's log?", true)?;
                self.lines("Press group 20 to confirm. Wait to keep it.", 18)?;
            }
            Screen::LedgerResetDone => {
                self.header("Log cleared", true)?;
                self.text("Today starts at zero", 0, 24)?;
                self.progress(frame, frames)?;
            }
            Screen::StorageFailure { message } => {
                self.header("SAVE FAILED", true)?;
                self.lines(message, 16)?;
            }
        }
        Ok(())
    }

    fn group_header(&mut self, group: &FoodGroup) -> Result<(), DisplayError> {
        // Light group colors get a filled bar, dark ones an outline
        self.header(group.name, group.color.luma() >= 128)
    }

    fn header(&mut self, title: &str, filled: bool) -> Result<(), DisplayError> {
        let bar = Rectangle::new(Point::zero(), Size::new(DISPLAY_WIDTH, HEADER_HEIGHT));
        let (style, text_color) = if filled {
            (PrimitiveStyle::with_fill(BinaryColor::On), BinaryColor::Off)
        } else {
            (PrimitiveStyle::with_stroke(BinaryColor::On, 1), BinaryColor::On)
        };
        bar.into_styled(style)
            .draw(&mut self.panel)
            .map_err(|e| DisplayError::Draw(format!("{:?}", e)))?;
        Text::with_baseline(
            title,
            Point::new(2, 1),
            MonoTextStyle::new(&FONT_6X10, text_color),
            Baseline::Top,
        )
        .draw(&mut self.panel)
        .map_err(|e| DisplayError::Draw(format!("{:?}", e)))?;
        Ok(())
    }

    fn text(&mut self, text: &str, x: i32, y: i32) -> Result<(), DisplayError> {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
            .draw(&mut self.panel)
            .map_err(|e| DisplayError::Draw(format!("{:?}", e)))?;
        Ok(())
    }

    fn large(&mut self, text: &str, x: i32, y: i32) -> Result<(), DisplayError> {
        let style = MonoTextStyle::new(&FONT_9X15, BinaryColor::On);
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
            .draw(&mut self.panel)
            .map_err(|e| DisplayError::Draw(format!("{:?}", e)))?;
        Ok(())
    }

    fn lines(&mut self, text: &str, top: i32) -> Result<(), DisplayError> {
        let mut y = top;
        for line in wrap(text, CHARS_PER_LINE) {
            if y > DISPLAY_HEIGHT as i32 - 10 {
                break;
            }
            self.text(&line, 0, y)?;
            y += 11;
        }
        Ok(())
    }

    fn progress(&mut self, frame: u32, frames: u32) -> Result<(), DisplayError> {
        let progress = if frames == 0 {
            1.0
        } else {
            (frame + 1) as f32 / frames as f32
        };
        let bar_width = ((DISPLAY_WIDTH - 20) as f32 * progress.clamp(0.0, 1.0)) as u32;

        Rectangle::new(Point::new(10, 48), Size::new(DISPLAY_WIDTH - 20, 8))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut self.panel)
            .map_err(|e| DisplayError::Draw(format!("{:?}", e)))?;

        if bar_width > 2 {
            Rectangle::new(Point::new(11, 49), Size::new(bar_width - 2, 6))
                .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(&mut self.panel)
                .map_err(|e| DisplayError::Draw(format!("{:?}", e)))?;
        }
        Ok(())
    }
}

impl<P> Renderer for OledRenderer<P>
where
    P: Panel,
    P::Error: Debug,
{
    async fn render(
        &mut self,
        screen: &Screen,
        interrupted: &dyn Fn() -> bool,
    ) -> Result<RenderOutcome, DisplayError> {
        let frames = animation_frames(screen);
        if frames == 0 {
            self.frame(screen, 0, 0)?;
            return Ok(RenderOutcome::Completed);
        }

        for frame in 0..frames {
            self.frame(screen, frame, frames)?;
            Timer::after(self.slice).await;
            if interrupted() {
                debug!("🖥️ Render interrupted at frame {}/{}", frame + 1, frames);
                return Ok(RenderOutcome::Interrupted);
            }
        }
        Ok(RenderOutcome::Completed)
    }
}

/// Number of animation slices a screen plays; zero for static screens.
pub fn animation_frames(screen: &Screen) -> u32 {
    match screen {
        Screen::ActionDone { .. } | Screen::LedgerResetDone => 10,
        Screen::Error(_) | Screen::Warning(_) => 6,
        _ => 0,
    }
}

fn question(action: Action) -> &'static str {
    match action {
        Action::AddDish => "Add dish?",
        Action::DeleteDish => "Delete dish?",
        Action::SaveMeal => "Save meal?",
    }
}

fn done(action: Action) -> &'static str {
    match action {
        Action::AddDish => "Dish added",
        Action::DeleteDish => "Deleted",
        Action::SaveMeal => "Meal saved",
    }
}

fn nothing_to(action: Action) -> &'static str {
    match action {
        Action::AddDish => "There is no food to add to the meal.",
        Action::DeleteDish => "There is no food to delete.",
        Action::SaveMeal => "There is no meal to save.",
    }
}

fn hint_text(hint: ErrorHint) -> &'static str {
    match hint {
        ErrorHint::PlaceContainer => "Place a container on the scale first.",
        ErrorHint::ChooseGroup => "Choose a food group first.",
        ErrorHint::ChooseProcessing => "Choose raw or cooked first.",
        ErrorHint::RemoveUnprocessedFood => "Remove the food, then choose raw or cooked.",
        ErrorHint::RemoveDish => "Lift the dish off the scale.",
        ErrorHint::Generic => "That is not possible right now.",
    }
}

/// Greedy word wrap. Words longer than a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let split = word
                .char_indices()
                .nth(width)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        let needed = if line.is_empty() { 0 } else { 1 } + word.chars().count();
        if line.chars().count() + needed > width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::framebuffer::FrameBuffer;
    use crate::nutrition::{groups::GroupColor, NutritionTotals};
    use embassy_futures::block_on;
    use std::cell::Cell;

    fn renderer() -> OledRenderer<FrameBuffer> {
        OledRenderer::with_slice(FrameBuffer::new(), Duration::from_millis(1))
    }

    fn group(luma: u8) -> FoodGroup {
        FoodGroup {
            id: 42,
            name: "Test group",
            examples: "Apples, pears and a very long example list that needs wrapping",
            color: GroupColor {
                r: luma,
                g: luma,
                b: luma,
            },
            carb_per_g: 0.1,
            protein_per_g: 0.0,
            fat_per_g: 0.0,
        }
    }

    #[test]
    fn test_static_screen_draws_once() {
        let mut r = renderer();
        let screen = Screen::Dashboard {
            last_meal: NutritionTotals::from_macros(300.0, 40.0, 20.0, 10.0),
            last_meal_dishes: 2,
            day: NutritionTotals::ZERO,
            meals_today: 1,
            just_saved: true,
        };
        let outcome = block_on(r.render(&screen, &|| true)).unwrap();
        assert_eq!(outcome, RenderOutcome::Completed);
        assert_eq!(r.panel().flushes(), 1);
        assert!(r.panel().lit_pixels() > 100);
    }

    #[test]
    fn test_animation_runs_all_frames() {
        let mut r = renderer();
        let screen = Screen::ActionDone {
            action: Action::AddDish,
            meal: NutritionTotals::ZERO,
            dishes: 1,
        };
        let outcome = block_on(r.render(&screen, &|| false)).unwrap();
        assert_eq!(outcome, RenderOutcome::Completed);
        assert_eq!(r.panel().flushes(), animation_frames(&screen));
        // Progress bar ends full
        assert!(r.panel().pixel(100, 52));
    }

    #[test]
    fn test_animation_stops_on_input() {
        let mut r = renderer();
        let polls = Cell::new(0);
        let interrupted = || {
            polls.set(polls.get() + 1);
            polls.get() >= 3
        };
        let outcome = block_on(r.render(&Screen::Error(ErrorHint::ChooseGroup), &interrupted)).unwrap();
        assert_eq!(outcome, RenderOutcome::Interrupted);
        assert_eq!(r.panel().flushes(), 3);
    }

    #[test]
    fn test_group_header_follows_color_brightness() {
        let bright = group(250);
        let dark = group(20);

        let mut r = renderer();
        block_on(r.render(&Screen::GroupExamples { group: Box::leak(Box::new(bright)), needs_processing: true }, &|| false)).unwrap();
        let filled = r.panel().lit_in(0..128, 0..12);

        let mut r = renderer();
        block_on(r.render(&Screen::GroupExamples { group: Box::leak(Box::new(dark)), needs_processing: true }, &|| false)).unwrap();
        let outlined = r.panel().lit_in(0..128, 0..12);

        assert!(filled > outlined, "{} vs {}", filled, outlined);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("Choose raw or cooked first.", 12), vec!["Choose raw", "or cooked", "first."]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap("", 10).is_empty());
        for line in wrap(hint_text(ErrorHint::RemoveUnprocessedFood), CHARS_PER_LINE) {
            assert!(line.len() <= CHARS_PER_LINE);
        }
    }
}
