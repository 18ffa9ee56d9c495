//! Controllers attached below root ports and their endpoints.

use qforge_shared::errors::{QforgeError, QforgeResult};

use super::DiskOptions;
use super::boot::BootIndex;
use crate::constants::limits::{MAX_SCSI_DEVICES, MAX_SERIAL_PORTS, MAX_USB_PORTS};
use crate::constants::qemu::NUM_QUEUES;
use crate::qemu::host::IoThread;
use crate::qemu::option::Parameters;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerKind {
    /// virtio-scsi, serviced by an I/O thread.
    Scsi { iothread: IoThread },
    /// qemu-xhci.
    Usb,
    /// virtio-serial.
    Serial,
}

impl ControllerKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ControllerKind::Scsi { .. } => "scsi",
            ControllerKind::Usb => "usb",
            ControllerKind::Serial => "serial",
        }
    }

    pub fn driver(&self) -> &'static str {
        match self {
            ControllerKind::Scsi { .. } => "virtio-scsi-pci",
            ControllerKind::Usb => "qemu-xhci",
            ControllerKind::Serial => "virtio-serial-pci",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ControllerKind::Scsi { .. } => "SCSI controller",
            ControllerKind::Usb => "USB controller",
            ControllerKind::Serial => "serial controller",
        }
    }
}

/// Devices attached to a controller's bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    ScsiHd {
        lun: usize,
        drive: String,
        options: DiskOptions,
    },
    ScsiCd {
        lun: usize,
        drive: String,
        options: DiskOptions,
    },
    UsbTablet {
        port: usize,
    },
    UsbRedir {
        port: usize,
        chardev: String,
    },
    UsbStorage {
        port: usize,
        drive: String,
        boot_index: Option<BootIndex>,
    },
    SerialPort {
        nr: usize,
        chardev: String,
        name: String,
    },
}

impl Endpoint {
    pub fn driver(&self) -> &'static str {
        match self {
            Endpoint::ScsiHd { .. } => "scsi-hd",
            Endpoint::ScsiCd { .. } => "scsi-cd",
            Endpoint::UsbTablet { .. } => "usb-tablet",
            Endpoint::UsbRedir { .. } => "usb-redir",
            Endpoint::UsbStorage { .. } => "usb-storage",
            Endpoint::SerialPort { .. } => "virtserialport",
        }
    }
}

/// A controller occupying a root port's downstream slot.
///
/// The controller's own bus is named `{id}.0`, and endpoint `K` gets the id
/// `{id}.0.K`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controller {
    pub kind: ControllerKind,
    pub id: String,
    /// Root port the controller sits behind.
    pub parent: String,
    endpoints: Vec<Endpoint>,
}

impl Controller {
    pub(super) fn new(kind: ControllerKind, id: String, parent: String) -> Self {
        Self {
            kind,
            id,
            parent,
            endpoints: Vec::new(),
        }
    }

    /// Bus name QEMU assigns to the controller's downstream bus.
    pub fn bus(&self) -> String {
        format!("{}.0", self.id)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoint capacity, excluding reserved positions.
    pub fn capacity(&self) -> usize {
        match self.kind {
            ControllerKind::Scsi { .. } => MAX_SCSI_DEVICES,
            ControllerKind::Usb => MAX_USB_PORTS,
            ControllerKind::Serial => MAX_SERIAL_PORTS - 1,
        }
    }

    fn expect_kind(&self, wanted: &'static str) -> QforgeResult<()> {
        if self.kind.prefix() == wanted {
            Ok(())
        } else {
            Err(QforgeError::InvalidArgument(format!(
                "{} {} cannot host {wanted} devices",
                self.kind.label(),
                self.id
            )))
        }
    }

    /// Index for the next endpoint, or a capacity error naming the limit.
    fn allocate(&self) -> QforgeResult<usize> {
        let count = self.endpoints.len();
        if count >= self.capacity() {
            return Err(QforgeError::Capacity {
                resource: format!("{} {}", self.kind.label(), self.id),
                limit: self.capacity(),
                count,
            });
        }
        Ok(count)
    }

    fn push(&mut self, endpoint: Endpoint) -> String {
        let id = format!("{}.{}", self.bus(), self.endpoints.len());
        tracing::trace!(controller = %self.id, endpoint = %id, driver = endpoint.driver(), "Attached endpoint");
        self.endpoints.push(endpoint);
        id
    }

    pub fn add_scsi_disk(&mut self, drive: impl Into<String>, options: DiskOptions) -> QforgeResult<String> {
        self.expect_kind("scsi")?;
        let lun = self.allocate()?;
        Ok(self.push(Endpoint::ScsiHd {
            lun,
            drive: drive.into(),
            options,
        }))
    }

    pub fn add_scsi_cd(&mut self, drive: impl Into<String>, options: DiskOptions) -> QforgeResult<String> {
        self.expect_kind("scsi")?;
        let lun = self.allocate()?;
        Ok(self.push(Endpoint::ScsiCd {
            lun,
            drive: drive.into(),
            options,
        }))
    }

    /// USB ports are numbered from 1.
    pub fn add_usb_tablet(&mut self) -> QforgeResult<String> {
        self.expect_kind("usb")?;
        let port = self.allocate()? + 1;
        Ok(self.push(Endpoint::UsbTablet { port }))
    }

    pub fn add_usb_redir(&mut self, chardev: impl Into<String>) -> QforgeResult<String> {
        self.expect_kind("usb")?;
        let port = self.allocate()? + 1;
        Ok(self.push(Endpoint::UsbRedir {
            port,
            chardev: chardev.into(),
        }))
    }

    pub fn add_usb_storage(
        &mut self,
        drive: impl Into<String>,
        boot_index: Option<BootIndex>,
    ) -> QforgeResult<String> {
        self.expect_kind("usb")?;
        let port = self.allocate()? + 1;
        Ok(self.push(Endpoint::UsbStorage {
            port,
            drive: drive.into(),
            boot_index,
        }))
    }

    /// Serial port 0 is reserved for the legacy console, so ports start at 1.
    pub fn add_serial_port(
        &mut self,
        chardev: impl Into<String>,
        name: impl Into<String>,
    ) -> QforgeResult<String> {
        self.expect_kind("serial")?;
        let nr = self.allocate()? + 1;
        Ok(self.push(Endpoint::SerialPort {
            nr,
            chardev: chardev.into(),
            name: name.into(),
        }))
    }

    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params
            .add("driver", self.kind.driver())
            .add("id", &self.id)
            .add("bus", &self.parent);
        match &self.kind {
            ControllerKind::Scsi { iothread } => {
                params.add("iothread", iothread).add("num_queues", NUM_QUEUES);
            }
            ControllerKind::Usb => {
                // p2 covers USB 1/2 ports and p3 USB 3 ports.
                let ports = self.endpoints.len().max(4);
                params.add("p2", ports).add("p3", ports);
            }
            ControllerKind::Serial => {}
        }
        params
    }

    /// Parameters of each endpoint, in attachment order.
    pub fn endpoint_parameters(&self) -> Vec<Parameters> {
        let bus = self.bus();
        self.endpoints
            .iter()
            .enumerate()
            .map(|(index, endpoint)| {
                let mut params = Parameters::new();
                params
                    .add("driver", endpoint.driver())
                    .add("id", format!("{bus}.{index}"))
                    .add("bus", &bus);
                match endpoint {
                    Endpoint::ScsiHd { lun, drive, options }
                    | Endpoint::ScsiCd { lun, drive, options } => {
                        params
                            .add("channel", 0)
                            .add("scsi-id", 0)
                            .add("lun", lun)
                            .add("drive", drive)
                            .add_opt("wwn", options.wwn)
                            .add_opt("serial", options.serial.as_deref())
                            .add_opt("bootindex", options.boot_index);
                    }
                    Endpoint::UsbTablet { port } => {
                        params.add("port", port);
                    }
                    Endpoint::UsbRedir { port, chardev } => {
                        params.add("port", port).add("chardev", chardev);
                    }
                    Endpoint::UsbStorage {
                        port,
                        drive,
                        boot_index,
                    } => {
                        params
                            .add("port", port)
                            .add("drive", drive)
                            .add_opt("bootindex", *boot_index);
                    }
                    Endpoint::SerialPort { nr, chardev, name } => {
                        params.add("nr", nr).add("chardev", chardev).add("name", name);
                    }
                }
                params
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qemu::host::Resources;

    fn create_test_scsi() -> Controller {
        let thread = Resources::new().add_iothread();
        Controller::new(
            ControllerKind::Scsi { iothread: thread },
            "scsi.0".into(),
            "pcie.1.1".into(),
        )
    }

    #[test]
    fn test_scsi_parameters() {
        let mut scsi = create_test_scsi();
        scsi.add_scsi_disk(
            "alpha-os",
            DiskOptions {
                boot_index: Some(BootIndex(1)),
                serial: Some("ABC".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(
            scsi.parameters().to_string(),
            "driver=virtio-scsi-pci,id=scsi.0,bus=pcie.1.1,iothread=iothread.0,num_queues=4"
        );
        assert_eq!(
            scsi.endpoint_parameters()[0].to_string(),
            "driver=scsi-hd,id=scsi.0.0.0,bus=scsi.0.0,channel=0,scsi-id=0,lun=0,drive=alpha-os,serial=ABC,bootindex=1"
        );
    }

    #[test]
    fn test_scsi_capacity() {
        let mut scsi = create_test_scsi();
        for i in 0..28 {
            scsi.add_scsi_disk(format!("disk{i}"), DiskOptions::default()).unwrap();
        }
        let err = scsi.add_scsi_disk("disk28", DiskOptions::default()).unwrap_err();
        assert!(err.is_capacity());
        assert!(err.to_string().contains("limit of 28"));
        assert_eq!(scsi.len(), 28);
    }

    #[test]
    fn test_usb_ports_start_at_one() {
        let mut usb = Controller::new(ControllerKind::Usb, "usb.0".into(), "pcie.1.2".into());
        usb.add_usb_tablet().unwrap();
        usb.add_usb_redir("usbredir.0").unwrap();
        let eps = usb.endpoint_parameters();
        assert_eq!(eps[0].to_string(), "driver=usb-tablet,id=usb.0.0.0,bus=usb.0.0,port=1");
        assert_eq!(
            eps[1].to_string(),
            "driver=usb-redir,id=usb.0.0.1,bus=usb.0.0,port=2,chardev=usbredir.0"
        );
        assert_eq!(
            usb.parameters().to_string(),
            "driver=qemu-xhci,id=usb.0,bus=pcie.1.2,p2=4,p3=4"
        );

        for _ in 2..15 {
            usb.add_usb_tablet().unwrap();
        }
        assert!(usb.add_usb_tablet().unwrap_err().is_capacity());
    }

    #[test]
    fn test_serial_reserves_port_zero() {
        let mut serial = Controller::new(ControllerKind::Serial, "serial.0".into(), "pcie.1.3".into());
        serial.add_serial_port("guestagent", "org.qemu.guest_agent.0").unwrap();
        assert_eq!(
            serial.endpoint_parameters()[0].to_string(),
            "driver=virtserialport,id=serial.0.0.0,bus=serial.0.0,nr=1,chardev=guestagent,name=org.qemu.guest_agent.0"
        );
        for i in 1..30 {
            serial.add_serial_port(format!("c{i}"), format!("p{i}")).unwrap();
        }
        assert!(serial.add_serial_port("c30", "p30").unwrap_err().is_capacity());
        assert_eq!(serial.len(), 30);
    }

    #[test]
    fn test_kind_mismatch() {
        let mut serial = Controller::new(ControllerKind::Serial, "serial.0".into(), "pcie.1.3".into());
        assert!(serial.add_scsi_disk("d", DiskOptions::default()).is_err());
        assert!(serial.is_empty());
    }
}
