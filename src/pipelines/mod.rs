pub mod basecall_qc;
