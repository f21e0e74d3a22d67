//! Chart part reading (`c:chartSpace`): series points and their labels.

use crate::text::{attr_value, local_name, TextBodyReader};
use fontpush_core::{Chart, ChartSeries, DataLabel, DataPoint, Error, Result, TextFrame};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

/// Data reference of a series the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DataRef {
    Categories,
    Values,
    XValues,
    YValues,
}

impl DataRef {
    fn from_local(local: &[u8]) -> Option<Self> {
        match local {
            b"cat" => Some(Self::Categories),
            b"val" => Some(Self::Values),
            b"xVal" => Some(Self::XValues),
            b"yVal" => Some(Self::YValues),
            _ => None,
        }
    }
}

/// Point count of one data reference: the declared `c:ptCount`, else the
/// highest `c:pt/@idx` + 1.
#[derive(Debug, Clone, Copy, Default)]
struct RefCount {
    declared: Option<usize>,
    max_pt: usize,
}

impl RefCount {
    fn value(&self) -> usize {
        self.declared.unwrap_or(self.max_pt)
    }
}

#[derive(Debug, Default)]
struct SeriesDraft {
    current: Option<DataRef>,
    counts: BTreeMap<DataRef, RefCount>,
    in_labels: bool,
    labels: BTreeMap<usize, DataLabel>,
    label: Option<LabelDraft>,
}

#[derive(Debug, Default)]
struct LabelDraft {
    idx: Option<usize>,
    in_tx: bool,
    rich: Option<TextBodyReader>,
    text_frame: Option<TextFrame>,
}

impl SeriesDraft {
    fn count(&self, data: DataRef) -> Option<usize> {
        self.counts.get(&data).map(RefCount::value)
    }

    /// Number of points in the series.
    ///
    /// XY and bubble series (`c:yVal`) have as many points as the shorter of
    /// their x and y values. Category series take the category count, or the
    /// value count when the series has no categories.
    fn point_count(&self) -> usize {
        if let Some(y) = self.count(DataRef::YValues) {
            return match self.count(DataRef::XValues) {
                Some(x) => x.min(y),
                None => y,
            };
        }
        self.count(DataRef::Categories)
            .or_else(|| self.count(DataRef::Values))
            .unwrap_or(0)
    }

    fn finish(self) -> ChartSeries {
        let mut series = ChartSeries::new(self.point_count());
        for (idx, label) in self.labels {
            series.insert_point(
                idx,
                DataPoint {
                    data_label: Some(label),
                },
            );
        }
        series
    }

    /// Handle an end tag while a `c:dLbl` is open.
    fn end_label_element(&mut self, local: &[u8]) {
        let Some(label) = self.label.as_mut() else {
            return;
        };
        if let Some(mut rich) = label.rich.take() {
            if local == b"rich" {
                label.text_frame = Some(rich.finish());
            } else {
                rich.end(local);
                label.rich = Some(rich);
            }
            return;
        }

        match local {
            b"tx" => label.in_tx = false,
            b"dLbl" => {
                let done = std::mem::take(label);
                self.label = None;
                if let Some(idx) = done.idx {
                    self.labels.insert(
                        idx,
                        DataLabel {
                            text_frame: done.text_frame,
                        },
                    );
                }
            }
            _ => {}
        }
    }

    fn data_point(&mut self, local: &[u8], e: &BytesStart<'_>) {
        let Some(data) = self.current else {
            return;
        };
        let count = self.counts.entry(data).or_default();
        match local {
            b"ptCount" => count.declared = parse_usize(e),
            b"pt" => {
                let idx = attr_value(e, b"idx").and_then(|v| v.parse::<usize>().ok());
                count.max_pt = count.max_pt.max(idx.map_or(0, |i| i.saturating_add(1)));
            }
            _ => {}
        }
    }
}

fn parse_usize(e: &BytesStart<'_>) -> Option<usize> {
    attr_value(e, b"val").and_then(|v| v.parse().ok())
}

/// Read the series of a chart part.
///
/// Only per-point labels (`c:dLbl`) are kept, and only those with custom
/// rich text get a text frame. Labels past the series' point count are
/// dropped.
pub(crate) fn read_chart(xml: &str) -> Result<Chart> {
    let mut reader = Reader::from_str(xml);
    let mut chart = Chart::default();
    let mut series: Option<SeriesDraft> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if series.is_none() {
                    if local == b"ser" {
                        series = Some(SeriesDraft::default());
                    }
                    continue;
                }
                let Some(ser) = series.as_mut() else {
                    continue;
                };

                if let Some(label) = ser.label.as_mut() {
                    if let Some(rich) = label.rich.as_mut() {
                        rich.start(local, e);
                    } else if local == b"tx" {
                        label.in_tx = true;
                    } else if local == b"rich" && label.in_tx {
                        label.rich = Some(TextBodyReader::new());
                    }
                    continue;
                }

                if let Some(data) = DataRef::from_local(local) {
                    ser.current = Some(data);
                    ser.counts.entry(data).or_default();
                    continue;
                }
                match local {
                    b"dLbls" => ser.in_labels = true,
                    b"dLbl" if ser.in_labels => ser.label = Some(LabelDraft::default()),
                    _ => ser.data_point(local, e),
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                let Some(ser) = series.as_mut() else {
                    continue;
                };

                if let Some(label) = ser.label.as_mut() {
                    if let Some(rich) = label.rich.as_mut() {
                        rich.empty(local, e);
                    } else if local == b"idx" && !label.in_tx {
                        label.idx = parse_usize(e);
                    }
                    continue;
                }
                ser.data_point(local, e);
            }
            Ok(Event::Text(ref e)) => {
                let rich = series
                    .as_mut()
                    .and_then(|s| s.label.as_mut())
                    .and_then(|l| l.rich.as_mut());
                if let Some(rich) = rich {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Bad text in chart: {}", e)))?;
                    rich.text(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                let Some(ser) = series.as_mut() else {
                    continue;
                };

                if ser.label.is_some() {
                    ser.end_label_element(local);
                    continue;
                }

                if DataRef::from_local(local).is_some() {
                    ser.current = None;
                } else if local == b"dLbls" {
                    ser.in_labels = false;
                }
                if local == b"ser" {
                    if let Some(done) = series.take() {
                        chart.series.push(done.finish());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing chart: {}", e)));
            }
            _ => {}
        }
    }

    Ok(chart)
}
