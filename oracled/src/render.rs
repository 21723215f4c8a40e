//! The HTML chart: every implied-price sample of the window scattered
//! over block height, with the inferred price called out.
//!
//! The file is self-contained (inline canvas drawing, no external
//! assets) so it can be archived next to the numbers it illustrates.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Timelike;

use oracle_price::{PriceWindow, Refined};

use crate::pipeline::Inference;
use crate::OracleError;

/// Canvas geometry, in CSS pixels.
const WIDTH: u32 = 1000;
const HEIGHT: u32 = 660;

/// The chart's file name for this window.
pub fn file_name(window: &PriceWindow) -> String {
    match window {
        PriceWindow::Day { date, .. } => format!("UTXOracle_{}.html", date.format("%Y-%m-%d")),
        PriceWindow::Recent { first, last } => format!("UTXOracle_{}-{}.html", first, last),
    }
}

/// Write the chart into `dir`, returning the path written.
pub fn write_chart(dir: &Path, inference: &Inference) -> Result<PathBuf, OracleError> {
    let path = dir.join(file_name(&inference.result.window));
    let html = chart_html(inference);
    std::fs::write(&path, html)?;
    Ok(path)
}

fn chart_html(inference: &Inference) -> String {
    let refined = &inference.estimate.refined;
    let (price_low, price_high) = band_bounds(refined);

    // Keep the samples inside the reporting band, evenly spread on the x
    // axis so per-block bursts stay readable.
    let kept: Vec<_> = inference
        .estimate
        .samples
        .iter()
        .filter(|s| price_low < s.price && s.price < price_high)
        .collect();

    let mut xs = String::from("[");
    let mut ys = String::from("[");
    for (i, sample) in kept.iter().enumerate() {
        let _ = write!(xs, "{},", i);
        let _ = write!(ys, "{:.2},", sample.price);
    }
    xs.push(']');
    ys.push(']');

    // Five x-axis ticks labeled with block height and UTC time.
    let mut tick_positions = String::from("[");
    let mut tick_labels = String::from("[");
    if !kept.is_empty() {
        for t in 0..5 {
            let index = t * (kept.len() - 1) / 4;
            let sample = kept[index];
            let _ = write!(tick_positions, "{},", index);
            let _ = write!(
                tick_labels,
                "\"{}\\n{:02}:{:02} UTC\",",
                sample.height,
                sample.time.hour(),
                sample.time.minute()
            );
        }
    }
    tick_positions.push(']');
    tick_labels.push(']');

    let title = match &inference.result.window {
        PriceWindow::Day { date, .. } => format!("{} blocks from local node", date),
        PriceWindow::Recent { first, last } => format!("Local node blocks {}-{}", first, last),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>UTXOracle Local</title>
<style>
  body {{ background-color: black; margin: 0; color: #cccccc; font-family: Arial, sans-serif; text-align: center; }}
  canvas {{ background-color: black; display: block; margin: auto; }}
</style>
</head>
<body>
<canvas id="chart" width="{width}" height="{height}"></canvas>
<script>
const canvas = document.getElementById('chart');
const ctx = canvas.getContext('2d');
const width = {width}, height = {height};
const marginLeft = 120, marginRight = 90, marginTop = 100, marginBottom = 120;
const plotWidth = width - marginLeft - marginRight;
const plotHeight = height - marginTop - marginBottom;

const xs = {xs};
const ys = {ys};
const tickPositions = {tick_positions};
const tickLabels = {tick_labels};
const priceLow = {price_low:.2}, priceHigh = {price_high:.2};
const centralPrice = {central:.2};

function scaleX(x) {{
  return marginLeft + (xs.length > 1 ? x / (xs.length - 1) : 0.5) * plotWidth;
}}
function scaleY(p) {{
  return marginTop + (1 - (p - priceLow) / (priceHigh - priceLow)) * plotHeight;
}}

ctx.fillStyle = 'black';
ctx.fillRect(0, 0, width, height);

ctx.font = 'bold 36px Arial';
ctx.textAlign = 'center';
ctx.fillStyle = 'cyan';
ctx.fillText('UTXOracle', width / 2 - 60, 40);
ctx.fillStyle = 'lime';
ctx.fillText('Local', width / 2 + 95, 40);

ctx.font = '24px Arial';
ctx.textAlign = 'right';
ctx.fillStyle = 'white';
ctx.fillText('{title}', width / 2, 80);
ctx.textAlign = 'left';
ctx.fillStyle = 'lime';
ctx.fillText('price: ${central_int}', width / 2 + 10, 80);

ctx.strokeStyle = 'white';
ctx.lineWidth = 1;
ctx.strokeRect(marginLeft, marginTop, plotWidth, plotHeight);

ctx.fillStyle = 'white';
ctx.font = '20px Arial';
const yTicks = 5;
for (let i = 0; i <= yTicks; i++) {{
  const p = priceLow + (priceHigh - priceLow) * i / yTicks;
  const y = scaleY(p);
  ctx.beginPath();
  ctx.moveTo(marginLeft - 5, y);
  ctx.lineTo(marginLeft, y);
  ctx.stroke();
  ctx.textAlign = 'right';
  ctx.fillText(Math.round(p).toLocaleString(), marginLeft - 10, y + 4);
}}

ctx.textAlign = 'center';
ctx.font = '16px Arial';
for (let i = 0; i < tickPositions.length; i++) {{
  const x = scaleX(tickPositions[i]);
  ctx.beginPath();
  ctx.moveTo(x, marginTop + plotHeight);
  ctx.lineTo(x, marginTop + plotHeight + 5);
  ctx.stroke();
  const parts = tickLabels[i].split('\n');
  ctx.fillText(parts[0], x, marginTop + plotHeight + 20);
  ctx.fillText(parts[1], x, marginTop + plotHeight + 40);
}}

ctx.fillStyle = 'white';
ctx.font = '20px Arial';
ctx.textAlign = 'center';
ctx.fillText('Block Height and UTC Time', marginLeft + plotWidth / 2, height - 48);
ctx.save();
ctx.translate(20, marginTop + plotHeight / 2);
ctx.rotate(-Math.PI / 2);
ctx.fillText('BTC Price ($)', 0, 0);
ctx.restore();

ctx.fillStyle = 'cyan';
for (let i = 0; i < xs.length; i++) {{
  ctx.fillRect(scaleX(xs[i]), scaleY(ys[i]), 0.75, 0.75);
}}

ctx.font = '20px Arial';
ctx.textAlign = 'left';
ctx.fillText('- ' + centralPrice.toLocaleString(), marginLeft + plotWidth + 1, scaleY(centralPrice));
</script>
</body>
</html>
"#,
        width = WIDTH,
        height = HEIGHT,
        xs = xs,
        ys = ys,
        tick_positions = tick_positions,
        tick_labels = tick_labels,
        price_low = price_low,
        price_high = price_high,
        central = refined.central,
        central_int = inference.result.price_usd,
        title = title,
    )
}

fn band_bounds(refined: &Refined) -> (f64, f64) {
    (
        refined.central * (1.0 - refined.band),
        refined.central * (1.0 + refined.band),
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use oracle_chain::block::Height;

    use super::*;

    #[test]
    fn file_names_follow_the_window() {
        let day = PriceWindow::Day {
            date: NaiveDate::from_ymd(2024, 7, 4),
            first: Height(850_000),
            last: Height(850_143),
        };
        assert_eq!(file_name(&day), "UTXOracle_2024-07-04.html");

        let recent = PriceWindow::Recent {
            first: Height(880_000),
            last: Height(880_143),
        };
        assert_eq!(file_name(&recent), "UTXOracle_880000-880143.html");
    }
}
