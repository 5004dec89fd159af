//! Esri ASCII grid (`.asc`) reader and writer.
//!
//! The format is a plain-text header followed by row-major samples with
//! the first data row at the top of the grid:
//!
//! ```text
//! ncols        4
//! nrows        3
//! xllcorner    100.0
//! yllcorner    200.0
//! cellsize     10.0
//! NODATA_value -9999
//! 1 2 3 4
//! ...
//! ```
//!
//! `xllcenter`/`yllcenter` variants are accepted and shifted onto the
//! corner convention the raster uses internally.

use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tin_mesh::RasterDouble;

pub fn read_asc<R: Read>(input: R) -> Result<RasterDouble> {
  let reader = BufReader::new(input);
  let mut lines = reader.lines();

  let mut ncols: Option<usize> = None;
  let mut nrows: Option<usize> = None;
  let mut xll: Option<(f64, bool)> = None; // (value, is_center)
  let mut yll: Option<(f64, bool)> = None;
  let mut cell_size: Option<f64> = None;
  let mut no_data: f64 = -9999.0;

  // header lines until the first data row
  let mut pending_data: Option<String> = None;
  for line in lines.by_ref() {
    let line = line.context("reading header line")?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    let mut parts = trimmed.split_whitespace();
    let key = parts.next().unwrap_or_default().to_ascii_lowercase();
    let value = parts.next();

    let parse = |v: Option<&str>| -> Result<f64> {
      v.with_context(|| format!("header field {key} has no value"))?
        .parse::<f64>()
        .with_context(|| format!("header field {key} is not a number"))
    };

    match key.as_str() {
      "ncols" => ncols = Some(parse(value)? as usize),
      "nrows" => nrows = Some(parse(value)? as usize),
      "xllcorner" => xll = Some((parse(value)?, false)),
      "yllcorner" => yll = Some((parse(value)?, false)),
      "xllcenter" => xll = Some((parse(value)?, true)),
      "yllcenter" => yll = Some((parse(value)?, true)),
      "cellsize" => cell_size = Some(parse(value)?),
      "nodata_value" => no_data = parse(value)?,
      _ => {
        // first non-header line starts the sample block
        pending_data = Some(line);
        break;
      }
    }
  }

  let ncols = ncols.context("missing ncols header")?;
  let nrows = nrows.context("missing nrows header")?;
  let cell_size = cell_size.context("missing cellsize header")?;
  let (x, x_center) = xll.context("missing xllcorner/xllcenter header")?;
  let (y, y_center) = yll.context("missing yllcorner/yllcenter header")?;

  if ncols == 0 || nrows == 0 {
    bail!("raster dimensions must be positive");
  }

  let mut raster = RasterDouble::with_size(ncols, nrows);
  raster.set_cell_size(cell_size);
  raster.set_pos_x(if x_center { x - cell_size / 2.0 } else { x });
  raster.set_pos_y(if y_center { y - cell_size / 2.0 } else { y });
  raster.set_no_data_value(no_data);
  raster.set_all(no_data);

  let mut row = 0usize;
  let mut col = 0usize;
  let mut consume = |line: &str, row: &mut usize, col: &mut usize| -> Result<()> {
    for token in line.split_whitespace() {
      if *row >= nrows {
        bail!("more samples than ncols*nrows");
      }
      let v: f64 = token
        .parse()
        .with_context(|| format!("bad sample value {token:?} at row {row}, col {col}"))?;
      *raster.value_mut(*row, *col) = v;
      *col += 1;
      if *col == ncols {
        *col = 0;
        *row += 1;
      }
    }
    Ok(())
  };

  if let Some(first) = pending_data {
    consume(&first, &mut row, &mut col)?;
  }
  for line in lines {
    let line = line.context("reading data line")?;
    consume(&line, &mut row, &mut col)?;
  }

  if row != nrows || col != 0 {
    bail!(
      "expected {} samples, got {}",
      ncols * nrows,
      row * ncols + col
    );
  }

  Ok(raster)
}

pub fn read_asc_file(path: &Path) -> Result<RasterDouble> {
  let file =
    std::fs::File::open(path).with_context(|| format!("opening raster {}", path.display()))?;
  read_asc(file).with_context(|| format!("parsing raster {}", path.display()))
}

pub fn write_asc<W: Write>(output: W, raster: &RasterDouble) -> Result<()> {
  let mut out = BufWriter::new(output);

  writeln!(out, "ncols        {}", raster.width())?;
  writeln!(out, "nrows        {}", raster.height())?;
  writeln!(out, "xllcorner    {}", raster.pos_x())?;
  writeln!(out, "yllcorner    {}", raster.pos_y())?;
  writeln!(out, "cellsize     {}", raster.cell_size())?;
  writeln!(out, "NODATA_value {}", raster.no_data_value())?;

  for row in 0..raster.height() {
    let mut first = true;
    for col in 0..raster.width() {
      if !first {
        write!(out, " ")?;
      }
      write!(out, "{}", raster.value(row, col))?;
      first = false;
    }
    writeln!(out)?;
  }

  out.flush()?;
  Ok(())
}

#[cfg(test)]
#[path = "asc_grid_test.rs"]
mod asc_grid_test;
