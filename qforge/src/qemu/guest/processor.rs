//! Guest CPU model and topology (`-cpu`, `-smp`).

use crate::qemu::option::{Parameter, Parameters};

/// Hyper-V enlightenments enabled for every brand.
const HYPERV_FLAGS: &[(&str, &str)] = &[
    ("hv-relaxed", ""),
    ("hv-vapic", ""),
    ("hv-spinlocks", "0x1fff"),
    ("hv-vpindex", ""),
    ("hv-runtime", ""),
    ("hv-time", ""),
    ("hv-synic", ""),
    ("hv-stimer", ""),
    ("hv-tlbflush", ""),
    ("hv-ipi", ""),
    ("hv-frequencies", ""),
    ("hv-reenlightenment", ""),
    ("hv-stimer-direct", ""),
    ("hv-emsr-bitmap", ""),
    ("hv-xmm-input", ""),
    ("hv-tlbflush-ext", ""),
    ("hv-tlbflush-direct", ""),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Processor {
    /// Host processor brand, e.g. `AMD` or `Intel`.
    pub brand: String,
    pub sockets: u32,
    pub cores: u32,
    pub threads: u32,
    /// Present the guest with a Hyper-V compatible hypervisor.
    pub hyperv: bool,
}

impl Processor {
    fn is_brand(&self, brand: &str) -> bool {
        self.brand.eq_ignore_ascii_case(brand)
    }

    /// Host passthrough model plus feature flags.
    pub fn cpu(&self) -> Parameters {
        let mut params = Parameters::new();
        params.add_flag("host");

        // AMD only exposes SMT siblings with topoext.
        if self.threads > 1 && self.is_brand("AMD") {
            params.add("topoext", "on");
        }

        if self.hyperv {
            params.extend(
                HYPERV_FLAGS
                    .iter()
                    .map(|(name, value)| match *value {
                        "" => Parameter::flag(*name),
                        value => Parameter::new(*name, value),
                    })
                    .collect(),
            );
            if self.is_brand("AMD") {
                params.add("hv-avic", "on");
            }
            if self.is_brand("Intel") {
                params.add_flag("hv-evmcs");
            }
        }
        params
    }

    pub fn smp(&self) -> Parameters {
        let nonzero = |n: u32| (n > 0).then_some(n);
        let mut params = Parameters::new();
        params
            .add_opt("sockets", nonzero(self.sockets))
            .add_opt("cores", nonzero(self.cores))
            .add_opt("threads", nonzero(self.threads));
        params
    }
}
