//! tsa-snow: dry snow detection (Temporal Snow Area) from passive microwave radiometry
//!
//! Classifies forward and backward conical scans of multi-frequency brightness
//! temperatures into snow-covered and snow-free surfaces, grades each detection
//! by the agreement of independent rule sets, and merges the two scan
//! directions into a single product on a fixed Earth grid.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Band, BandObservation, BinaryGrid, Channel, Geolocation, Layer, Polarization, QualityGrid,
    ScanDirection, ScanObservation, TbField, TsaError, TsaResult,
};

pub use crate::core::{
    classify_auxiliary_scattering, classify_auxiliary_spectral_gradient, classify_primary,
    combine, composite_quality, score, DetectionAlgorithm, Reconciled, Resampler, TargetGrid,
    TsaProcessor, TsaProduct,
};
pub use io::{ProductDescriptor, ProductType, ResolvedConfig, TsaConfig};

#[cfg(feature = "python")]
mod python {
    use crate::types::TsaError;
    use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::prelude::*;

    /// Convert PyReadonlyArray2 to ndarray Array2
    fn numpy_to_array2<T>(arr: PyReadonlyArray2<T>) -> ndarray::Array2<T>
    where
        T: Copy + numpy::Element,
    {
        arr.as_array().to_owned()
    }

    fn to_py_err(e: TsaError) -> PyErr {
        match e {
            TsaError::DimensionMismatch { .. } | TsaError::Configuration(_) => {
                PyValueError::new_err(e.to_string())
            }
            _ => PyRuntimeError::new_err(e.to_string()),
        }
    }

    /// Primary dry snow decision (0/1)
    #[pyfunction]
    fn classify_primary<'py>(
        py: Python<'py>,
        ku_h: PyReadonlyArray2<f64>,
        ka_h: PyReadonlyArray2<f64>,
        ka_v: PyReadonlyArray2<f64>,
    ) -> PyResult<&'py PyArray2<u8>> {
        let tsa = crate::core::classify_primary(
            &numpy_to_array2(ku_h),
            &numpy_to_array2(ka_h),
            &numpy_to_array2(ka_v),
        )
        .map_err(to_py_err)?;
        Ok(tsa.into_pyarray(py))
    }

    /// Scattering rule with confounder elimination (0/1)
    #[pyfunction]
    fn classify_auxiliary_scattering<'py>(
        py: Python<'py>,
        ku_h: PyReadonlyArray2<f64>,
        ku_v: PyReadonlyArray2<f64>,
        ka_v: PyReadonlyArray2<f64>,
    ) -> PyResult<&'py PyArray2<u8>> {
        let tsa = crate::core::classify_auxiliary_scattering(
            &numpy_to_array2(ku_h),
            &numpy_to_array2(ku_v),
            &numpy_to_array2(ka_v),
        )
        .map_err(to_py_err)?;
        Ok(tsa.into_pyarray(py))
    }

    /// Spectral gradient rule against a lower-frequency band (0/1)
    #[pyfunction]
    fn classify_auxiliary_spectral_gradient<'py>(
        py: Python<'py>,
        ka_h: PyReadonlyArray2<f64>,
        ka_v: PyReadonlyArray2<f64>,
        band2_h: PyReadonlyArray2<f64>,
        band2_v: PyReadonlyArray2<f64>,
    ) -> PyResult<&'py PyArray2<u8>> {
        let tsa = crate::core::classify_auxiliary_spectral_gradient(
            &numpy_to_array2(ka_h),
            &numpy_to_array2(ka_v),
            &numpy_to_array2(band2_h),
            &numpy_to_array2(band2_v),
        )
        .map_err(to_py_err)?;
        Ok(tsa.into_pyarray(py))
    }

    /// Confidence code (0..=3) from the three classifier outputs
    #[pyfunction]
    fn score<'py>(
        py: Python<'py>,
        primary: PyReadonlyArray2<u8>,
        aux_scatter: PyReadonlyArray2<u8>,
        aux_spectral: PyReadonlyArray2<u8>,
    ) -> PyResult<&'py PyArray2<u8>> {
        let quality = crate::core::score(
            &numpy_to_array2(primary),
            &numpy_to_array2(aux_scatter),
            &numpy_to_array2(aux_spectral),
        )
        .map_err(to_py_err)?;
        Ok(quality.into_pyarray(py))
    }

    /// Forward/backward reconciliation, returns (combined, combined_uncertain)
    #[pyfunction]
    fn combine<'py>(
        py: Python<'py>,
        value_fwd: PyReadonlyArray2<f64>,
        value_bck: PyReadonlyArray2<f64>,
    ) -> PyResult<(&'py PyArray2<f64>, &'py PyArray2<f64>)> {
        let reconciled =
            crate::core::combine(&numpy_to_array2(value_fwd), &numpy_to_array2(value_bck))
                .map_err(to_py_err)?;
        Ok((
            reconciled.combined.into_pyarray(py),
            reconciled.combined_uncertain.into_pyarray(py),
        ))
    }

    /// Gridded quality composite (0..=6, NaN where neither scan covers)
    #[pyfunction]
    fn composite_quality<'py>(
        py: Python<'py>,
        grid_fwd: PyReadonlyArray2<f64>,
        grid_bck: PyReadonlyArray2<f64>,
    ) -> PyResult<&'py PyArray2<f64>> {
        let composite =
            crate::core::composite_quality(&numpy_to_array2(grid_fwd), &numpy_to_array2(grid_bck))
                .map_err(to_py_err)?;
        Ok(composite.into_pyarray(py))
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(classify_primary, m)?)?;
        m.add_function(wrap_pyfunction!(classify_auxiliary_scattering, m)?)?;
        m.add_function(wrap_pyfunction!(classify_auxiliary_spectral_gradient, m)?)?;
        m.add_function(wrap_pyfunction!(score, m)?)?;
        m.add_function(wrap_pyfunction!(combine, m)?)?;
        m.add_function(wrap_pyfunction!(composite_quality, m)?)?;
        Ok(())
    }
}
