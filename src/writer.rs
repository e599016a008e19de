use std::{fs::File, io::BufWriter, path::Path, sync::mpsc::Receiver};

use log::error;
use serde_jsonlines::JsonLinesWriter;

use crate::{RepCounterError, pose::RepOutput};

/// Write every rep record received on `rep_receiver` to `file` as JSON lines, until
/// all senders are dropped. Stops at the first record that cannot be written, dropping
/// the receiver so senders see the writer is gone.
pub fn write_reps(file: &Path, rep_receiver: Receiver<RepOutput>) -> Result<(), RepCounterError> {
    let rep_file = File::create(file).map_err(|e| RepCounterError::WriterError { source: e })?;
    let mut rep_file_writer = JsonLinesWriter::new(BufWriter::new(rep_file));
    for output in &rep_receiver {
        rep_file_writer.write(&output).map_err(|e| {
            error!("Error while writing rep record to output file: {}", e);
            RepCounterError::WriterError { source: e }
        })?;
    }
    rep_file_writer
        .flush()
        .map_err(|e| RepCounterError::WriterError { source: e })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, thread};

    use super::*;
    use crate::pose::{Phase, RepCounterState, RepEvent, SessionInfo};

    #[test]
    fn test_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reps.jsonl");
        let outputs = vec![
            RepOutput::SessionStart(SessionInfo::default()),
            RepOutput::Rep(RepEvent {
                frame_no: 0,
                timestamp_ms: 0,
                angle: Some(169.4717223351219),
                state: RepCounterState {
                    count: 0,
                    phase: Phase::Flexed,
                },
                new_rep: false,
            }),
            RepOutput::Rep(RepEvent {
                frame_no: 1,
                timestamp_ms: 33,
                angle: None,
                state: RepCounterState {
                    count: 0,
                    phase: Phase::Flexed,
                },
                new_rep: false,
            }),
            RepOutput::Rep(RepEvent {
                frame_no: 2,
                timestamp_ms: 66,
                angle: Some(0.1 + 0.2),
                state: RepCounterState {
                    count: 0,
                    phase: Phase::Flexed,
                },
                new_rep: false,
            }),
        ];

        let (tx, rx) = mpsc::channel();
        for output in &outputs {
            tx.send(output.clone()).unwrap();
        }
        drop(tx);
        write_reps(&path, rx).unwrap();

        let written = serde_jsonlines::json_lines(&path)
            .unwrap()
            .collect::<Result<Vec<RepOutput>, std::io::Error>>()
            .unwrap();
        assert_eq!(written, outputs);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_write_failure_stops_writer() {
        // rendezvous channel: every send waits for the writer to take the record
        let (tx, rx) = mpsc::sync_channel(0);
        let handle = thread::spawn(move || write_reps(Path::new("/dev/full"), rx));

        let record = RepOutput::Rep(RepEvent {
            frame_no: 0,
            timestamp_ms: 0,
            angle: Some(123.456789),
            state: RepCounterState::default(),
            new_rep: false,
        });
        let mut hung_up = false;
        for _ in 0..1_000_000 {
            if tx.send(record.clone()).is_err() {
                hung_up = true;
                break;
            }
        }
        drop(tx);

        assert!(hung_up, "Writer kept accepting records after a failed write");
        assert!(matches!(
            handle.join().unwrap(),
            Err(RepCounterError::WriterError { .. })
        ));
    }

    #[test]
    fn test_unwritable_path() {
        let (_tx, rx) = mpsc::channel();
        let result = write_reps(Path::new("/nonexistent/dir/reps.jsonl"), rx);
        assert!(matches!(result, Err(RepCounterError::WriterError { .. })));
    }
}
