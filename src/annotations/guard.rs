//! Consistency guard: refuse to pair annotations with re-processed data.
//!
//! Stored epoch indices and component numbers are only meaningful against the
//! exact cut/fit they were made on. Each check either seeds the entry's
//! fingerprint (first save) or validates the freshly loaded data against it,
//! failing with [`Error::ParameterMismatch`] naming the first field that
//! diverged. A failed check must leave the on-disk document untouched, which
//! the store guarantees by checking before it saves.

use std::collections::BTreeSet;

use crate::artifact::{Epochs, Ica};
use crate::error::{Error, Result};

use super::document::{EpochsEntry, EpochsParams, IcaEntry, IcaParams};

// tmin/tmax and filter edges are cut/fit *parameters*, not measurements:
// a re-run with the same configuration reproduces them bit for bit, so the
// comparison is exact with no tolerance.
#[allow(clippy::float_cmp)]
pub(super) fn check_epochs(entry: &mut EpochsEntry, epochs: &Epochs) -> Result<()> {
    let Some(params) = &entry.params else {
        entry.params = Some(EpochsParams {
            tmin: epochs.tmin(),
            tmax: epochs.tmax(),
            events: epochs.events().to_vec(),
        });
        return Ok(());
    };

    if epochs.tmin() != params.tmin {
        return Err(Error::ParameterMismatch {
            field: "tmin",
            stored: params.tmin.to_string(),
            current: epochs.tmin().to_string(),
        });
    }
    if epochs.tmax() != params.tmax {
        return Err(Error::ParameterMismatch {
            field: "tmax",
            stored: params.tmax.to_string(),
            current: epochs.tmax().to_string(),
        });
    }

    // The retained set may have narrowed since the last save (further manual
    // rejection), so only epochs in the intersection of the two selections
    // are checked; their event sample-times must all have been seen before.
    let prev_selection: BTreeSet<usize> = match &entry.selection {
        Some(selection) => selection.iter().copied().collect(),
        None => epochs.selection().iter().copied().collect(),
    };
    for (pos, orig) in epochs.selection().iter().enumerate() {
        if !prev_selection.contains(orig) {
            continue;
        }
        let event = epochs.events()[pos];
        if !params.events.contains(&event) {
            return Err(Error::ParameterMismatch {
                field: "events",
                stored: format!("{} recorded event sample-times", params.events.len()),
                current: format!("unknown sample {event} at epoch {orig}"),
            });
        }
    }
    Ok(())
}

#[allow(clippy::float_cmp)]
pub(super) fn check_ica(entry: &mut IcaEntry, ica: &Ica) -> Result<()> {
    let Some(params) = &entry.params else {
        entry.params = Some(IcaParams {
            ch_names: ica.ch_names().to_vec(),
            fit_params: ica.fit_params().clone(),
            n_components: ica.n_components(),
            highpass: ica.highpass(),
            lowpass: ica.lowpass(),
            sfreq: ica.sfreq(),
        });
        return Ok(());
    };

    // Strict field-by-field equality: a decomposition is only comparable to
    // annotations made against the identical fit.
    if ica.ch_names() != params.ch_names {
        return Err(Error::ParameterMismatch {
            field: "ch_names",
            stored: format!("{:?}", params.ch_names),
            current: format!("{:?}", ica.ch_names()),
        });
    }
    if *ica.fit_params() != params.fit_params {
        return Err(Error::ParameterMismatch {
            field: "fit_params",
            stored: serde_json::Value::Object(params.fit_params.clone()).to_string(),
            current: serde_json::Value::Object(ica.fit_params().clone()).to_string(),
        });
    }
    if ica.n_components() != params.n_components {
        return Err(Error::ParameterMismatch {
            field: "n_components",
            stored: params.n_components.to_string(),
            current: ica.n_components().to_string(),
        });
    }
    if ica.highpass() != params.highpass {
        return Err(Error::ParameterMismatch {
            field: "highpass",
            stored: params.highpass.to_string(),
            current: ica.highpass().to_string(),
        });
    }
    if ica.lowpass() != params.lowpass {
        return Err(Error::ParameterMismatch {
            field: "lowpass",
            stored: params.lowpass.to_string(),
            current: ica.lowpass().to_string(),
        });
    }
    if ica.sfreq() != params.sfreq {
        return Err(Error::ParameterMismatch {
            field: "sfreq",
            stored: params.sfreq.to_string(),
            current: ica.sfreq().to_string(),
        });
    }
    Ok(())
}
