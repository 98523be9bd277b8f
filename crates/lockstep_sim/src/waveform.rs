//! Value-change recording for scenario waveforms.
//!
//! [`TraceRecorder`] collects every value change of the signals of one
//! scenario in memory and renders them as an IEEE 1364 Value Change Dump
//! (VCD) with a 1 ps timescale, viewable in GTKWave or Surfer. Changes are
//! buffered rather than streamed so that signals may be declared at any point
//! before the dump is written.

use std::io::Write;

use lockstep_common::LogicVec;

use crate::error::SimError;
use crate::signal::SignalId;
use crate::time::SimTime;

struct TracedSignal {
    id: SignalId,
    name: String,
    width: u32,
    code: String,
}

/// In-memory recorder of signal value changes.
pub struct TraceRecorder {
    scope: String,
    signals: Vec<TracedSignal>,
    changes: Vec<(SimTime, SignalId, LogicVec)>,
}

impl TraceRecorder {
    /// Creates an empty recorder whose signals live in module scope `scope`.
    pub fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            signals: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Adds a signal to the dump header.
    pub fn register_signal(&mut self, id: SignalId, name: &str, width: u32) {
        let code = make_id_code(self.signals.len() as u32);
        self.signals.push(TracedSignal {
            id,
            name: name.to_string(),
            width,
            code,
        });
    }

    /// Records that `id` took `value` at `time`. Changes must be recorded in
    /// non-decreasing time order.
    pub fn record_change(&mut self, time: SimTime, id: SignalId, value: LogicVec) {
        self.changes.push((time, id, value));
    }

    /// Number of recorded changes.
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// Writes the complete dump.
    pub fn write_vcd<W: Write>(&self, mut out: W) -> Result<(), SimError> {
        writeln!(out, "$version")?;
        writeln!(out, "  lockstep {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "$end")?;
        writeln!(out, "$timescale")?;
        writeln!(out, "  1ps")?;
        writeln!(out, "$end")?;
        writeln!(out, "$scope module {} $end", self.scope)?;
        for sig in &self.signals {
            writeln!(out, "$var wire {} {} {} $end", sig.width, sig.code, sig.name)?;
        }
        writeln!(out, "$upscope $end")?;
        writeln!(out, "$enddefinitions $end")?;

        let mut current: Option<SimTime> = None;
        for (time, id, value) in &self.changes {
            let Some(sig) = self.signals.iter().find(|s| s.id == *id) else {
                return Err(SimError::invalid(format!(
                    "trace change for unregistered signal {}",
                    id.as_raw()
                )));
            };
            if current != Some(*time) {
                if current.is_none() {
                    writeln!(out, "#{}", time.ps)?;
                    writeln!(out, "$dumpvars")?;
                } else {
                    writeln!(out, "#{}", time.ps)?;
                }
                current = Some(*time);
            }
            let text = format_value(value);
            if sig.width == 1 {
                writeln!(out, "{text}{}", sig.code)?;
            } else {
                writeln!(out, "{text} {}", sig.code)?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

/// Generates a VCD identifier from a sequential index using printable ASCII
/// starting at `!`.
fn make_id_code(index: u32) -> String {
    let mut result = String::new();
    let mut idx = index;
    loop {
        result.push((b'!' + (idx % 94) as u8) as char);
        idx /= 94;
        if idx == 0 {
            break;
        }
        idx -= 1;
    }
    result
}

fn format_value(value: &LogicVec) -> String {
    let bits = (0..value.width())
        .rev()
        .map(|i| value.get(i).to_vcd_char());
    if value.width() == 1 {
        bits.collect()
    } else {
        std::iter::once('b').chain(bits).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalRegistry;
    use crate::time::Timebase;

    fn render(rec: &TraceRecorder) -> String {
        let mut out = Vec::new();
        rec.write_vcd(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn id_codes() {
        assert_eq!(make_id_code(0), "!");
        assert_eq!(make_id_code(1), "\"");
        assert_eq!(make_id_code(93), "~");
        assert_eq!(make_id_code(94).len(), 2);
    }

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(&LogicVec::from_bool(true)), "1");
        assert_eq!(format_value(&LogicVec::unknown(1)), "x");
        assert_eq!(
            format_value(&LogicVec::from_binary_str("10xz").unwrap()),
            "b10xz"
        );
    }

    #[test]
    fn empty_dump_has_header() {
        let rec = TraceRecorder::new("bench");
        let text = render(&rec);
        assert!(text.contains("$timescale\n  1ps\n$end"));
        assert!(text.contains("$scope module bench $end"));
        assert!(text.ends_with("$enddefinitions $end\n"));
    }

    #[test]
    fn changes_grouped_by_time() {
        let mut rec = TraceRecorder::new("bench");
        let clk = SignalId::from_raw(0);
        let count = SignalId::from_raw(1);
        rec.register_signal(clk, "clk_i", 1);
        rec.register_signal(count, "count_o", 3);
        rec.record_change(SimTime::zero(), clk, LogicVec::from_bool(false));
        rec.record_change(SimTime::zero(), count, LogicVec::unknown(3));
        rec.record_change(SimTime::from_ps(500), clk, LogicVec::from_bool(true));
        rec.record_change(SimTime::from_ps(501), count, LogicVec::from_u64(5, 3));
        let text = render(&rec);
        assert!(text.contains("$var wire 1 ! clk_i $end"));
        assert!(text.contains("$var wire 3 \" count_o $end"));
        assert!(text.contains("#0\n$dumpvars\n0!\nbxxx \"\n#500\n1!\n#501\nb101 \"\n"));
        assert_eq!(rec.change_count(), 4);
    }

    #[test]
    fn unregistered_change_is_error() {
        let mut rec = TraceRecorder::new("bench");
        rec.record_change(
            SimTime::zero(),
            SignalId::from_raw(7),
            LogicVec::from_bool(true),
        );
        let mut out = Vec::new();
        assert!(rec.write_vcd(&mut out).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn registry_records_through_signals() {
        let mut reg = SignalRegistry::with_trace(Timebase::start(), "counter");
        let up = reg.declare("up_i", 1).unwrap();
        tokio::time::sleep(SimTime::from_ps(250).to_runtime()).await;
        up.drive_bool(true);
        up.drive_bool(true);
        let text = String::from_utf8(reg.render_trace().unwrap().unwrap()).unwrap();
        assert!(text.contains("#0\n$dumpvars\nx!\n#250\n1!\n"));
        assert_eq!(text.matches("1!").count(), 1);
    }
}
