use std::io::{prelude::*, BufReader, Read};

use crate::dictionary::connector::ConnectionTable;
use crate::errors::{Result, SumomoError};

const NAME: &str = "matrix.def";

impl ConnectionTable {
    /// Creates a new instance from `matrix.def`.
    ///
    /// The header holds the numbers of rows and columns, and each following
    /// line holds `right_id left_id cost`. Missing cells cost zero.
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let reader = BufReader::new(rdr);
        let mut lines = reader.lines();

        let header = lines
            .next()
            .transpose()?
            .ok_or_else(|| SumomoError::invalid_format(NAME, "The header is missing."))?;
        let (num_rows, num_cols) = Self::parse_header(&header)?;
        let mut data = vec![0; num_rows * num_cols];

        for line in lines {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (right_id, left_id, cost) = Self::parse_body(line)?;
            if num_rows <= right_id || num_cols <= left_id {
                let msg = format!("An id is out of the {num_rows}x{num_cols} matrix, {line}");
                return Err(SumomoError::invalid_format(NAME, msg));
            }
            data[right_id * num_cols + left_id] = cost;
        }
        tracing::debug!(num_rows, num_cols, "loaded the connection matrix");
        Self::new(num_rows, num_cols, data)
    }

    fn parse_header(line: &str) -> Result<(usize, usize)> {
        let cols: Vec<_> = line.split_whitespace().collect();
        if cols.len() != 2 {
            let msg =
                format!("The header must consist of two integers separated by spaces, {line}");
            return Err(SumomoError::invalid_format(NAME, msg));
        }
        let parse = |col: &str| {
            col.parse::<u16>().map(usize::from).map_err(|e| {
                SumomoError::invalid_format(NAME, format!("Invalid header: {e}, {line}"))
            })
        };
        Ok((parse(cols[0])?, parse(cols[1])?))
    }

    fn parse_body(line: &str) -> Result<(usize, usize, i16)> {
        let cols: Vec<_> = line.split_whitespace().collect();
        if cols.len() != 3 {
            let msg = format!(
                "A row other than the header must consist of three integers separated by spaces, {line}"
            );
            return Err(SumomoError::invalid_format(NAME, msg));
        }
        let invalid = |e: std::num::ParseIntError| {
            SumomoError::invalid_format(NAME, format!("Invalid row: {e}, {line}"))
        };
        Ok((
            cols[0].parse().map_err(invalid)?,
            cols[1].parse().map_err(invalid)?,
            cols[2].parse().map_err(invalid)?,
        ))
    }
}
