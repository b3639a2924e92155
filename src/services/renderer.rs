use crate::services::rate_estimator::Sample;
use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use tracing::debug;

/// Горизонтальный отступ графика в пикселях
const PAD_X: f64 = 6.0;
/// Минимальный масштаб по оси WPM
const MIN_SCALE: u32 = 10;
const GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Всё, что нужно отрисовать за один тик
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub sample: &'a Sample,
    /// История WPM от старых к новым
    pub history: &'a [u32],
    pub windows: [f64; 3],
}

pub trait Renderer: Send {
    fn render(&mut self, frame: &Frame<'_>);
}

/// Точки линейного графика истории в области `width` x `height`.
///
/// По X точки распределены равномерно (единственная точка по центру), по Y
/// значение масштабируется к `max(10, max(history))` и зажимается в `[1, height - 1]`.
pub fn plot_points(history: &[u32], width: f64, height: f64) -> Vec<(f64, f64)> {
    if history.is_empty() {
        return Vec::new();
    }

    let max_wpm = history.iter().copied().max().unwrap_or(0).max(MIN_SCALE) as f64;
    let usable_w = (width.max(1.0) - 2.0 * PAD_X).max(1.0);
    let last = history.len() - 1;

    history
        .iter()
        .enumerate()
        .map(|(i, &wpm)| {
            let rx = if last == 0 { 0.5 } else { i as f64 / last as f64 };
            let x = PAD_X + rx * usable_w;
            let y = height - (wpm as f64 / max_wpm) * height;
            (x, y.min(height - 1.0).max(1.0))
        })
        .collect()
}

/// Однострочный спарклайн из точек графика
pub fn sparkline(history: &[u32], height: f64) -> String {
    let height = height.max(2.0);
    plot_points(history, history.len() as f64, height)
        .into_iter()
        .map(|(_, y)| {
            let level = (height - y) / height;
            let idx = (level * GLYPHS.len() as f64).floor() as usize;
            GLYPHS[idx.min(GLYPHS.len() - 1)]
        })
        .collect()
}

/// Строка состояния без цветовых escape-последовательностей
pub fn status_line(frame: &Frame<'_>) -> String {
    let [w15, w30, w60] = frame.windows;
    format!(
        "{:>2}s: {:>3} WPM | {:>2}s: {:>3} WPM | {:>2}s: {:>3} WPM [{}]",
        w15, frame.sample.wpm15, w30, frame.sample.wpm30, w60, frame.sample.wpm60,
        frame.sample.band.name(),
    )
}

/// Отрисовка в терминал одной обновляемой строкой с 24-битным цветом полосы
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    width: usize,
    height: f64,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout(width: usize, height: u32) -> Self {
        Self::new(io::stdout(), width, height)
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, width: usize, height: u32) -> Self {
        Self {
            out,
            width: width.max(1),
            height: f64::from(height),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&mut self, frame: &Frame<'_>) {
        let color = frame.sample.band.color();
        // В строку помещаются только последние `width` значений
        let visible = &frame.history[frame.history.len().saturating_sub(self.width)..];

        let result = queue!(
            self.out,
            MoveToColumn(0),
            SetForegroundColor(Color::Rgb {
                r: color.r,
                g: color.g,
                b: color.b,
            }),
            Print(status_line(frame)),
            Print(' '),
            Print(sparkline(visible, self.height)),
            ResetColor,
            Clear(ClearType::UntilNewLine),
        )
        .and_then(|_| self.out.flush());

        // Вывод не критичен для подсчёта
        if let Err(e) = result {
            debug!("Ошибка вывода в терминал: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::color_bands::{ColorBand, Rgb};

    fn sample(wpm15: u32) -> Sample {
        Sample {
            wpm15,
            wpm30: 20,
            wpm60: 10,
            band: ColorBand::new("slow", 30, Rgb { r: 255, g: 77, b: 79 }),
        }
    }

    #[test]
    fn test_plot_points_within_viewport() {
        let history = [0, 5, 40, 120, 60];
        let points = plot_points(&history, 300.0, 60.0);

        assert_eq!(points.len(), history.len());
        assert_eq!(points[0].0, PAD_X);
        assert_eq!(points[4].0, 300.0 - PAD_X);
        for (x, y) in points {
            assert!((PAD_X..=300.0 - PAD_X).contains(&x));
            assert!((1.0..=59.0).contains(&y));
        }
    }

    #[test]
    fn test_plot_single_point_is_centered() {
        let points = plot_points(&[7], 112.0, 60.0);
        assert_eq!(points, vec![(56.0, 60.0 - 0.7 * 60.0)]);
    }

    #[test]
    fn test_plot_empty_history() {
        assert!(plot_points(&[], 300.0, 60.0).is_empty());
    }

    #[test]
    fn test_sparkline_levels() {
        let line = sparkline(&[0, 50, 100], 60.0);
        let glyphs: Vec<char> = line.chars().collect();
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[0], '▁');
        assert_eq!(glyphs[2], '█');
        assert!(glyphs[0] < glyphs[1] && glyphs[1] < glyphs[2]);
    }

    #[test]
    fn test_terminal_renderer_output() {
        let sample = sample(12);
        let history = [3, 12];
        let frame = Frame {
            sample: &sample,
            history: &history,
            windows: [15.0, 30.0, 60.0],
        };

        let mut renderer = TerminalRenderer::new(Vec::new(), 60, 60);
        renderer.render(&frame);
        let output = String::from_utf8(renderer.into_inner()).unwrap();

        // Возврат в начало строки, цвет полосы, очистка хвоста строки
        assert!(output.starts_with("\x1b[1G"));
        assert!(output.contains("\x1b[38;2;255;77;79m"));
        assert!(output.ends_with("\x1b[0m\x1b[K"));
        assert!(output.contains("15s:  12 WPM"));
        assert!(output.contains("60s:  10 WPM"));
        assert!(output.contains("[slow]"));
    }

    #[test]
    fn test_terminal_renderer_keeps_latest_samples() {
        let sample = sample(0);
        let history: Vec<u32> = (0..100).collect();
        let frame = Frame {
            sample: &sample,
            history: &history,
            windows: [15.0, 30.0, 60.0],
        };

        let mut renderer = TerminalRenderer::new(Vec::new(), 8, 60);
        renderer.render(&frame);
        let output = String::from_utf8(renderer.into_inner()).unwrap();

        let glyphs = output.chars().filter(|ch| GLYPHS.contains(ch)).count();
        assert_eq!(glyphs, 8);
    }
}
