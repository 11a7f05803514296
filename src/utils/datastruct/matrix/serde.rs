use num::Num;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::CscMatrix;

impl<N> Serialize for CscMatrix<N>
where
    N: Num + Serialize + Copy,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // fields: n_rows, col_ptr, row_ind, values
        let col_ptr: Vec<u64> = self.col_ptr.iter().map(|&p| p as u64).collect();
        let mut state = serializer.serialize_struct("CscMatrix", 4)?;
        state.serialize_field("n_rows", &(self.n_rows as u64))?;
        state.serialize_field("col_ptr", &col_ptr)?;
        state.serialize_field("row_ind", &self.row_ind)?;
        state.serialize_field("values", &self.values)?;
        state.end()
    }
}

impl<'de, N> Deserialize<'de> for CscMatrix<N>
where
    N: Num + Deserialize<'de> + Copy,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct CscMatrixData<N> {
            n_rows: u64,
            col_ptr: Vec<u64>,
            row_ind: Vec<u32>,
            values: Vec<N>,
        }

        let data = CscMatrixData::<N>::deserialize(deserializer)?;
        let col_ptr = data.col_ptr.into_iter().map(|p| p as usize).collect();
        // a matrix that breaks its invariants is rejected here, not at first use
        CscMatrix::from_parts(data.n_rows as usize, col_ptr, data.row_ind, data.values)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbor_keeps_entries_and_shape() {
        let mut m = CscMatrix::<u8>::new(5);
        m.push_pattern_column(&[0, 4], 1);
        m.push_pattern_column(&[], 1);
        m.push_pattern_column(&[2], 1);

        let bytes = serde_cbor::to_vec(&m).unwrap();
        let de: CscMatrix<u8> = serde_cbor::from_slice(&bytes).unwrap();

        assert_eq!(de, m);
        assert_eq!(de.shape(), (5, 3));
    }

    #[test]
    fn rejects_unsorted_column_on_decode() {
        #[derive(Serialize)]
        struct Raw {
            n_rows: u64,
            col_ptr: Vec<u64>,
            row_ind: Vec<u32>,
            values: Vec<u8>,
        }
        let raw = Raw {
            n_rows: 3,
            col_ptr: vec![0, 2],
            row_ind: vec![2, 1],
            values: vec![1, 1],
        };
        let bytes = serde_cbor::to_vec(&raw).unwrap();
        assert!(serde_cbor::from_slice::<CscMatrix<u8>>(&bytes).is_err());
    }
}
