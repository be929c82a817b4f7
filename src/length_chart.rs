//! SVG line chart of sequence length per accession.

use crate::taxon_report::SequenceRecord;
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Line, Path, Rectangle, Text};

const W: f32 = 1000.0;
const H: f32 = 500.0;
const LEFT: f32 = 80.0;
const RIGHT: f32 = W - 20.0;
const TOP: f32 = 40.0;
const BOTTOM: f32 = H - 130.0;
const Y_TICKS: usize = 5;
const SERIES_COLOR: &str = "#1f77b4";
const LABEL_ROTATION_DEG: f32 = -75.0;

pub struct LengthChart<'a> {
    title: String,
    records: &'a [SequenceRecord],
}

impl<'a> LengthChart<'a> {
    pub fn new(title: &str, records: &'a [SequenceRecord]) -> Self {
        Self {
            title: title.to_string(),
            records,
        }
    }

    pub fn to_svg(&self) -> String {
        let y_max = nice_upper_bound(self.records.iter().map(|r| r.length).max().unwrap_or(0));

        let mut doc = Document::new()
            .set("viewBox", (0, 0, W, H))
            .set("width", W)
            .set("height", H)
            .add(
                Rectangle::new()
                    .set("x", 0)
                    .set("y", 0)
                    .set("width", W)
                    .set("height", H)
                    .set("fill", "#ffffff"),
            )
            .add(
                Text::new(self.title.clone())
                    .set("x", W / 2.0)
                    .set("y", TOP - 16.0)
                    .set("text-anchor", "middle")
                    .set("font-family", "sans-serif")
                    .set("font-size", 13)
                    .set("fill", "#111111"),
            );

        doc = add_axes(doc);
        doc = add_y_ticks(doc, y_max);

        let points = self
            .records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                (
                    index_to_x(idx, self.records.len()),
                    length_to_y(record.length, y_max),
                )
            })
            .collect::<Vec<_>>();

        if let Some((first, rest)) = points.split_first() {
            let data = rest
                .iter()
                .fold(Data::new().move_to(*first), |data, point| data.line_to(*point));
            doc = doc.add(
                Path::new()
                    .set("d", data)
                    .set("fill", "none")
                    .set("stroke", SERIES_COLOR)
                    .set("stroke-width", 1.5),
            );
        }

        for ((x, y), record) in points.iter().zip(self.records) {
            doc = doc
                .add(
                    Circle::new()
                        .set("cx", *x)
                        .set("cy", *y)
                        .set("r", 2.5)
                        .set("fill", SERIES_COLOR),
                )
                .add(
                    Text::new(record.accession.clone())
                        .set("x", *x)
                        .set("y", BOTTOM + 10.0)
                        .set("text-anchor", "end")
                        .set(
                            "transform",
                            format!("rotate({LABEL_ROTATION_DEG} {x} {})", BOTTOM + 10.0),
                        )
                        .set("font-family", "sans-serif")
                        .set("font-size", 7)
                        .set("fill", "#111111"),
                );
        }

        doc.to_string()
    }
}

fn add_axes(doc: Document) -> Document {
    doc.add(
        Line::new()
            .set("x1", LEFT)
            .set("y1", BOTTOM)
            .set("x2", RIGHT)
            .set("y2", BOTTOM)
            .set("stroke", "#000000")
            .set("stroke-width", 1),
    )
    .add(
        Line::new()
            .set("x1", LEFT)
            .set("y1", TOP)
            .set("x2", LEFT)
            .set("y2", BOTTOM)
            .set("stroke", "#000000")
            .set("stroke-width", 1),
    )
    .add(
        Text::new("Sequence length")
            .set("x", 18.0)
            .set("y", (TOP + BOTTOM) / 2.0)
            .set("text-anchor", "middle")
            .set("transform", format!("rotate(-90 18 {})", (TOP + BOTTOM) / 2.0))
            .set("font-family", "sans-serif")
            .set("font-size", 10)
            .set("fill", "#111111"),
    )
    .add(
        Text::new("Accession number")
            .set("x", (LEFT + RIGHT) / 2.0)
            .set("y", H - 8.0)
            .set("text-anchor", "middle")
            .set("font-family", "sans-serif")
            .set("font-size", 10)
            .set("fill", "#111111"),
    )
}

fn add_y_ticks(mut doc: Document, y_max: usize) -> Document {
    for tick in 0..=Y_TICKS {
        let value = y_max * tick / Y_TICKS;
        let y = length_to_y(value, y_max);
        doc = doc
            .add(
                Line::new()
                    .set("x1", LEFT - 4.0)
                    .set("y1", y)
                    .set("x2", LEFT)
                    .set("y2", y)
                    .set("stroke", "#000000")
                    .set("stroke-width", 1),
            )
            .add(
                Text::new(value.to_string())
                    .set("x", LEFT - 6.0)
                    .set("y", y + 3.0)
                    .set("text-anchor", "end")
                    .set("font-family", "sans-serif")
                    .set("font-size", 8)
                    .set("fill", "#111111"),
            );
    }
    doc
}

fn index_to_x(idx: usize, count: usize) -> f32 {
    if count <= 1 {
        return (LEFT + RIGHT) / 2.0;
    }
    let frac = idx as f32 / (count - 1) as f32;
    LEFT + (RIGHT - LEFT) * frac
}

fn length_to_y(length: usize, y_max: usize) -> f32 {
    if y_max == 0 {
        return BOTTOM;
    }
    let frac = length as f32 / y_max as f32;
    BOTTOM - (BOTTOM - TOP) * frac
}

/// Rounds up to 1, 2 or 5 times a power of ten so tick labels stay readable.
fn nice_upper_bound(max: usize) -> usize {
    if max == 0 {
        return 1;
    }
    let mut magnitude = 1usize;
    while magnitude.saturating_mul(10) <= max {
        magnitude *= 10;
    }
    [1, 2, 5, 10]
        .iter()
        .map(|step| step * magnitude)
        .find(|&bound| bound >= max)
        .unwrap_or(max)
}
