use color_eyre::eyre::Result;
use locsync_core::Segment;
use std::io::Write;

pub const HEADER: [&str; 8] = [
    "file",
    "id",
    "source",
    "target",
    "status",
    "state",
    "tm_match",
    "translatable",
];

pub fn write_csv<W: Write>(writer: W, segments: &[Segment]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;

    for s in segments {
        wtr.write_record([
            s.file_name.as_str(),
            s.id.as_str(),
            s.source.as_str(),
            s.target.as_str(),
            s.status.as_str(),
            s.internal_state.as_str(),
            if s.is_tm_match { "true" } else { "false" },
            if s.is_translatable { "true" } else { "false" },
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
