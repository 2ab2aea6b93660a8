use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::PathBuf;

use market_analytics::{
    CompetitorPosition, ForecastPoint, RegionalShareRow, SegmentCount, Table, YearlySummaryRow,
};

/// Palette and canvas settings for every chart the visualizer draws.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub palette: Vec<RGBColor>,
    pub font_family: String,
    pub width: u32,
    pub height: u32,
}

impl ChartStyle {
    /// Palette entry `idx`, cycling when the palette is shorter.
    pub fn color(&self, idx: usize) -> RGBColor {
        if self.palette.is_empty() {
            BLACK
        } else {
            self.palette[idx % self.palette.len()]
        }
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            palette: vec![
                RGBColor(31, 119, 180),
                RGBColor(255, 127, 14),
                RGBColor(44, 160, 44),
                RGBColor(214, 39, 40),
                RGBColor(148, 103, 189),
            ],
            font_family: "sans-serif".to_string(),
            width: 1200,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPanel {
    pub title: &'static str,
    pub points: Vec<(i32, f64)>,
}

/// One panel per summed market column, in capacity, generation, value,
/// investment order.
pub fn trend_panels(summary: &Table<YearlySummaryRow>) -> Vec<TrendPanel> {
    vec![
        trend_panel(summary, "Installed Capacity (MW)", |r| r.installed_capacity_mw),
        trend_panel(summary, "Generation (GWh)", |r| r.generation_gwh),
        trend_panel(summary, "Market Value (Million USD)", |r| r.market_value_million_usd),
        trend_panel(summary, "Investment (Million USD)", |r| r.investment_million_usd),
    ]
}

fn trend_panel(
    summary: &Table<YearlySummaryRow>,
    title: &'static str,
    value: fn(&YearlySummaryRow) -> f64,
) -> TrendPanel {
    TrendPanel {
        title,
        points: summary.iter().map(|r| (r.year, value(r))).collect(),
    }
}

/// Labelled bar heights; `None` leaves the slot empty.
pub fn regional_bars(
    regional: &Table<RegionalShareRow>,
    value: fn(&RegionalShareRow) -> Option<f64>,
) -> Vec<(String, Option<f64>)> {
    regional.iter().map(|r| (r.region.clone(), value(r))).collect()
}

pub fn segment_bars(segments: &[SegmentCount]) -> Vec<(String, Option<f64>)> {
    segments
        .iter()
        .map(|s| (s.category.clone(), Some(s.count as f64)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    pub historical: Vec<(i32, f64)>,
    pub forecast: Vec<(i32, f64)>,
}

impl ForecastSeries {
    pub fn new(summary: &Table<YearlySummaryRow>, forecast: &Table<ForecastPoint>) -> Self {
        let mut forecast: Vec<(i32, f64)> = forecast
            .iter()
            .map(|p| (p.year, p.market_value_forecast))
            .collect();
        forecast.sort_by_key(|(year, _)| *year);

        Self {
            historical: summary
                .iter()
                .map(|r| (r.year, r.market_value_million_usd))
                .collect(),
            forecast,
        }
    }

    pub fn year_range(&self) -> Range<i32> {
        let years = || self.historical.iter().chain(&self.forecast).map(|(y, _)| *y);
        match (years().min(), years().max()) {
            (Some(min), Some(max)) if min < max => min..max,
            (Some(year), _) => (year - 1)..(year + 1),
            _ => 0..1,
        }
    }

    pub fn value_range(&self) -> Range<f64> {
        padded_range(
            self.historical
                .iter()
                .chain(&self.forecast)
                .map(|(_, v)| *v),
        )
    }
}

/// Axis range covering `values` with 10% headroom on each side.
pub fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let pad = if max > min { (max - min) * 0.1 } else { min.abs().max(1.0) * 0.1 };
    (min - pad)..(max + pad)
}

fn year_axis(points: &[(i32, f64)]) -> Range<i32> {
    let min = points.iter().map(|(y, _)| *y).min().unwrap_or(0);
    let max = points.iter().map(|(y, _)| *y).max().unwrap_or(0);
    if min < max {
        min..max
    } else {
        (min - 1)..(max + 1)
    }
}

pub struct MarketVisualizer {
    output_dir: PathBuf,
    style: ChartStyle,
}

impl MarketVisualizer {
    pub fn new(output_dir: PathBuf, style: ChartStyle) -> Result<Self> {
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir, style })
    }

    pub fn generate_market_trends_chart(&self, summary: &Table<YearlySummaryRow>) -> Result<PathBuf> {
        let output_path = self.output_dir.join("market_trends.png");
        {
            let root = BitMapBackend::new(&output_path, (self.style.width, self.style.height))
                .into_drawing_area();
            root.fill(&WHITE)?;
            let root = root.titled(
                "Brazil Hydro Energy Market Trends",
                (self.style.font_family.as_str(), 30).into_font(),
            )?;

            for (idx, (area, panel)) in root
                .split_evenly((2, 2))
                .iter()
                .zip(trend_panels(summary))
                .enumerate()
            {
                let color = self.style.color(idx);
                let mut chart = ChartBuilder::on(area)
                    .caption(panel.title, (self.style.font_family.as_str(), 20).into_font())
                    .margin(10)
                    .x_label_area_size(30)
                    .y_label_area_size(70)
                    .build_cartesian_2d(
                        year_axis(&panel.points),
                        padded_range(panel.points.iter().map(|(_, v)| *v)),
                    )?;

                chart.configure_mesh().x_desc("Year").draw()?;

                chart.draw_series(LineSeries::new(
                    panel.points.iter().copied(),
                    color.stroke_width(3),
                ))?;
                chart.draw_series(
                    panel
                        .points
                        .iter()
                        .map(|&(year, value)| Circle::new((year, value), 4, color.filled())),
                )?;
            }

            root.present()?;
        }
        Ok(output_path)
    }

    pub fn generate_regional_chart(&self, regional: &Table<RegionalShareRow>) -> Result<PathBuf> {
        let output_path = self.output_dir.join("regional_analysis.png");
        {
            let root = BitMapBackend::new(&output_path, (self.style.width, self.style.height / 2 + 100))
                .into_drawing_area();
            root.fill(&WHITE)?;
            let root = root.titled(
                "Regional Market Analysis",
                (self.style.font_family.as_str(), 30).into_font(),
            )?;

            let areas = root.split_evenly((1, 2));
            self.draw_bars(
                &areas[0],
                "Market Share by Region",
                "Market Value Share (%)",
                &regional_bars(regional, |r| r.value_share_pct),
                self.style.color(0),
            )?;
            self.draw_bars(
                &areas[1],
                "Installed Capacity by Region",
                "Installed Capacity (MW)",
                &regional_bars(regional, |r| Some(r.installed_capacity_mw)),
                self.style.color(1),
            )?;

            root.present()?;
        }
        Ok(output_path)
    }

    pub fn generate_competitor_chart(&self, positions: &[CompetitorPosition]) -> Result<PathBuf> {
        let output_path = self.output_dir.join("competitor_analysis.png");
        {
            let root = BitMapBackend::new(&output_path, (self.style.width, self.style.height * 3 / 4))
                .into_drawing_area();
            root.fill(&WHITE)?;
            let root = root.titled(
                "Competitive Analysis",
                (self.style.font_family.as_str(), 30).into_font(),
            )?;

            let areas = root.split_evenly((1, 2));
            let shares: Vec<(String, Option<f64>)> = positions
                .iter()
                .map(|p| (p.company_name.clone(), Some(p.market_share_percent)))
                .collect();
            self.draw_bars(
                &areas[0],
                "Market Share Distribution",
                "Market Share (%)",
                &shares,
                self.style.color(0),
            )?;

            let mut chart = ChartBuilder::on(&areas[1])
                .caption(
                    "Competitive Positioning",
                    (self.style.font_family.as_str(), 20).into_font(),
                )
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(
                    padded_range(positions.iter().map(|p| p.market_share_percent)),
                    padded_range(positions.iter().map(|p| p.strength_score)),
                )?;

            chart
                .configure_mesh()
                .x_desc("Market Share (%)")
                .y_desc("Strength Score")
                .draw()?;

            let color = self.style.color(2);
            chart.draw_series(positions.iter().map(|p| {
                Circle::new(
                    (p.market_share_percent, p.strength_score),
                    bubble_radius(p.bubble_size),
                    color.mix(0.6).filled(),
                )
            }))?;
            chart.draw_series(positions.iter().map(|p| {
                Text::new(
                    p.company_name.clone(),
                    (p.market_share_percent, p.strength_score),
                    (self.style.font_family.as_str(), 12).into_font(),
                )
            }))?;

            root.present()?;
        }
        Ok(output_path)
    }

    pub fn generate_customer_chart(
        &self,
        customer_types: &[SegmentCount],
        size_categories: &[SegmentCount],
    ) -> Result<PathBuf> {
        let output_path = self.output_dir.join("customer_segmentation.png");
        {
            let root = BitMapBackend::new(&output_path, (self.style.width, self.style.height / 2 + 100))
                .into_drawing_area();
            root.fill(&WHITE)?;
            let root = root.titled(
                "Customer Segmentation",
                (self.style.font_family.as_str(), 30).into_font(),
            )?;

            let areas = root.split_evenly((1, 2));
            self.draw_bars(
                &areas[0],
                "Customer Type Distribution",
                "Customers",
                &segment_bars(customer_types),
                self.style.color(0),
            )?;
            self.draw_bars(
                &areas[1],
                "Size Category Distribution",
                "Customers",
                &segment_bars(size_categories),
                self.style.color(1),
            )?;

            root.present()?;
        }
        Ok(output_path)
    }

    pub fn generate_forecast_chart(&self, series: &ForecastSeries) -> Result<PathBuf> {
        let output_path = self.output_dir.join("market_forecast.png");
        {
            let root = BitMapBackend::new(&output_path, (self.style.width, self.style.height / 2 + 100))
                .into_drawing_area();
            root.fill(&WHITE)?;

            let mut chart = ChartBuilder::on(&root)
                .caption("Market Forecast", (self.style.font_family.as_str(), 30).into_font())
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(80)
                .build_cartesian_2d(series.year_range(), series.value_range())?;

            chart
                .configure_mesh()
                .x_desc("Year")
                .y_desc("Market Value (Million USD)")
                .draw()?;

            let historical = self.style.color(0);
            let forecast = self.style.color(1);

            chart
                .draw_series(LineSeries::new(
                    series.historical.iter().copied(),
                    historical.stroke_width(3),
                ))?
                .label("Historical")
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], historical.stroke_width(3)));

            chart
                .draw_series(LineSeries::new(
                    series.forecast.iter().copied(),
                    forecast.stroke_width(3),
                ))?
                .label("Forecast")
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], forecast.stroke_width(3)));

            chart.draw_series(
                series
                    .forecast
                    .iter()
                    .map(|&(year, value)| Circle::new((year, value), 4, forecast.filled())),
            )?;

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;

            root.present()?;
        }
        Ok(output_path)
    }

    fn draw_bars(
        &self,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        title: &str,
        y_desc: &str,
        bars: &[(String, Option<f64>)],
        color: RGBColor,
    ) -> Result<()> {
        if bars.is_empty() {
            return Ok(());
        }

        let max = bars
            .iter()
            .filter_map(|(_, v)| *v)
            .fold(0.0_f64, f64::max);
        let y_max = if max > 0.0 { max * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(area)
            .caption(title, (self.style.font_family.as_str(), 20).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..bars.len() as u32).into_segmented(), 0.0..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(y_desc)
            .x_labels(bars.len())
            .x_label_formatter(&|x| match x {
                SegmentValue::CenterOf(idx) => bars
                    .get(*idx as usize)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(bars.iter().enumerate().filter_map(|(idx, (_, value))| {
            value.map(|v| {
                let idx = idx as u32;
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(idx), 0.0), (SegmentValue::Exact(idx + 1), v)],
                    color.filled(),
                );
                bar.set_margin(0, 0, 8, 8);
                bar
            })
        }))?;

        Ok(())
    }
}

/// Marker radius in pixels for a bubble size (capacity in GW).
fn bubble_radius(bubble_size: f64) -> u32 {
    (bubble_size.max(0.0).sqrt() * 4.0).clamp(4.0, 40.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_row(year: i32, capacity: f64, value: f64) -> YearlySummaryRow {
        YearlySummaryRow {
            year,
            installed_capacity_mw: capacity,
            generation_gwh: capacity * 4.0,
            market_value_million_usd: value,
            investment_million_usd: value / 10.0,
            number_of_plants: 3,
            installed_capacity_mw_growth_pct: None,
            generation_gwh_growth_pct: None,
            market_value_million_usd_growth_pct: None,
            investment_million_usd_growth_pct: None,
        }
    }

    #[test]
    fn test_trend_panels_follow_summary_columns() {
        let summary = Table::new(vec![summary_row(2020, 100.0, 10.0), summary_row(2021, 150.0, 15.0)]);
        let panels = trend_panels(&summary);

        assert_eq!(panels.len(), 4);
        assert_eq!(panels[0].title, "Installed Capacity (MW)");
        assert_eq!(panels[0].points, vec![(2020, 100.0), (2021, 150.0)]);
        assert_eq!(panels[1].points, vec![(2020, 400.0), (2021, 600.0)]);
        assert_eq!(panels[2].points, vec![(2020, 10.0), (2021, 15.0)]);
        assert_eq!(panels[3].points, vec![(2020, 1.0), (2021, 1.5)]);
    }

    #[test]
    fn test_padded_range() {
        let range = padded_range([10.0, 20.0].into_iter());
        assert!((range.start - 9.0).abs() < 1e-9);
        assert!((range.end - 21.0).abs() < 1e-9);

        let flat = padded_range([5.0].into_iter());
        assert!(flat.start < 5.0 && flat.end > 5.0);

        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
    }

    #[test]
    fn test_year_axis_widens_single_year() {
        assert_eq!(year_axis(&[(2021, 1.0)]), 2020..2022);
        assert_eq!(year_axis(&[(2019, 1.0), (2023, 2.0)]), 2019..2023);
    }

    #[test]
    fn test_forecast_series_spans_history_and_forecast() {
        let summary = Table::new(vec![summary_row(2020, 100.0, 10.0), summary_row(2021, 150.0, 15.0)]);
        let forecast = Table::new(vec![
            ForecastPoint {
                year: 2025,
                market_value_forecast: 30.0,
            },
            ForecastPoint {
                year: 2023,
                market_value_forecast: 20.0,
            },
        ]);

        let series = ForecastSeries::new(&summary, &forecast);
        assert_eq!(series.historical, vec![(2020, 10.0), (2021, 15.0)]);
        assert_eq!(series.forecast, vec![(2023, 20.0), (2025, 30.0)]);
        assert_eq!(series.year_range(), 2020..2025);
        let values = series.value_range();
        assert!(values.start < 10.0 && values.end > 30.0);
    }

    #[test]
    fn test_regional_bars_keep_missing_shares_empty() {
        let regional = Table::new(vec![RegionalShareRow {
            year: 2021,
            region: "N".to_string(),
            installed_capacity_mw: 0.0,
            generation_gwh: 0.0,
            market_value_million_usd: 0.0,
            investment_million_usd: 0.0,
            number_of_plants: 0,
            capacity_share_pct: None,
            value_share_pct: None,
        }]);

        let bars = regional_bars(&regional, |r| r.value_share_pct);
        assert_eq!(bars, vec![("N".to_string(), None)]);
    }

    #[test]
    fn test_style_palette_cycles() {
        let style = ChartStyle::default();
        assert_eq!(style.color(0), style.color(style.palette.len()));

        let bare = ChartStyle {
            palette: Vec::new(),
            ..ChartStyle::default()
        };
        assert_eq!(bare.color(3), BLACK);
    }

    #[test]
    fn test_regional_chart_written_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let visualizer =
            MarketVisualizer::new(dir.path().join("charts"), ChartStyle::default()).unwrap();
        let regional = Table::new(vec![RegionalShareRow {
            year: 2021,
            region: "Sul".to_string(),
            installed_capacity_mw: 50.0,
            generation_gwh: 25.0,
            market_value_million_usd: 5.0,
            investment_million_usd: 2.0,
            number_of_plants: 4,
            capacity_share_pct: Some(100.0),
            value_share_pct: Some(100.0),
        }]);

        let path = visualizer.generate_regional_chart(&regional).unwrap();
        assert_eq!(path, dir.path().join("charts/regional_analysis.png"));
        assert!(path.exists());
    }

    #[test]
    fn test_bubble_radius_bounds() {
        assert_eq!(bubble_radius(0.0), 4);
        assert_eq!(bubble_radius(1000.0), 40);
        assert_eq!(bubble_radius(16.0), 16);
    }
}
