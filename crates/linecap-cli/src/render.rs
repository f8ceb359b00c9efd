//! Frame persistence: paints line events onto a canvas and writes each
//! finished frame as a binary PPM image.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use linecap_core::{Event, LineSnapshot};

/// RGB canvas for one frame. Lines outside the frame and pixels past its
/// width are clipped.
#[derive(Debug)]
pub struct FrameCanvas {
    frame: u64,
    width: usize,
    height: usize,
    rgb: Vec<u8>,
    lines_painted: usize,
}

impl FrameCanvas {
    pub fn new(frame: u64, width: u16, height: u16) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            frame,
            width,
            height,
            rgb: vec![0; width * height * 3],
            lines_painted: 0,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn lines_painted(&self) -> usize {
        self.lines_painted
    }

    pub fn paint_line(&mut self, line: &LineSnapshot) {
        if line.index >= self.height {
            return;
        }
        let row = line.index * self.width * 3;
        for (x, pixel) in line.pixels.iter().take(self.width).enumerate() {
            let offset = row + x * 3;
            self.rgb[offset..offset + 3].copy_from_slice(&pixel.to_rgb());
        }
        self.lines_painted += 1;
    }

    pub fn write_ppm<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        out.write_all(&self.rgb)
    }
}

/// Writes `frame-NNNNN.ppm` files into a directory as frames complete.
#[derive(Debug)]
pub struct FrameWriter {
    dir: PathBuf,
    canvas: Option<FrameCanvas>,
    written: Vec<PathBuf>,
}

impl FrameWriter {
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create frames directory: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            canvas: None,
            written: Vec::new(),
        })
    }

    pub fn handle(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::FrameStarted {
                frame,
                width,
                height,
                ..
            } => {
                self.flush()?;
                self.canvas = Some(FrameCanvas::new(*frame, *width, *height));
            }
            Event::LineCompleted(line) => {
                if let Some(canvas) = self.canvas.as_mut().filter(|c| c.frame() == line.frame) {
                    canvas.paint_line(line);
                }
            }
        }
        Ok(())
    }

    /// Write the frame in progress, if any line reached it.
    pub fn flush(&mut self) -> Result<()> {
        let Some(canvas) = self.canvas.take() else {
            return Ok(());
        };
        if canvas.lines_painted() == 0 {
            log::debug!("frame {} has no lines, not written", canvas.frame());
            return Ok(());
        }

        let path = self.dir.join(format!("frame-{:05}.ppm", canvas.frame()));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create frame image: {}", path.display()))?;
        let mut out = BufWriter::new(file);
        canvas
            .write_ppm(&mut out)
            .and_then(|()| out.flush())
            .with_context(|| format!("Failed to write frame image: {}", path.display()))?;
        log::debug!("frame {} written -> {}", canvas.frame(), path.display());
        self.written.push(path);
        Ok(())
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}
