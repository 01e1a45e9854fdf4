//! SDP service record for the HID keyboard/mouse service.
//!
//! # What is SDP? (for beginners)
//!
//! The Service Discovery Protocol lets a remote host ask "what can you do?"
//! before connecting.  A HID device answers with a *service record*: a list
//! of numbered attributes saying it is a Human Interface Device, which PSMs
//! its control and interrupt channels use, and (most importantly) the HID
//! report descriptor that tells the host how to parse our reports.
//!
//! BlueZ accepts the record as XML when a profile is registered; see
//! [`bluez::BluezRegistrar`].

pub mod bluez;

use std::fmt::Write as _;

use bthid_core::protocol::report_descriptor_hex;
use uuid::Uuid;

/// Bluetooth base UUID with the HID service class `0x1124`.
pub const HID_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1124_0000_1000_8000_0080_5f9b_34fb);

/// D-Bus object path the profile is registered under.
pub const PROFILE_OBJECT_PATH: &str = "/bluez/bthid/profile";

/// Human-readable parts of the record plus the channel PSMs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub name: String,
    pub description: String,
    pub provider: String,
    pub control_psm: u16,
    pub interrupt_psm: u16,
}

impl ServiceRecord {
    /// Renders the record in the XML dialect BlueZ parses.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(4096);
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<record>\n");

        // Service class: HID.
        attr(&mut xml, 0x0001, "<sequence><uuid value=\"0x1124\" /></sequence>");
        // L2CAP on the control PSM, carrying HIDP.
        attr(
            &mut xml,
            0x0004,
            &format!(
                "<sequence><sequence><uuid value=\"0x0100\" /><uint16 value=\"0x{:04x}\" /></sequence>\
                 <sequence><uuid value=\"0x0011\" /></sequence></sequence>",
                self.control_psm
            ),
        );
        // Public browse group.
        attr(&mut xml, 0x0005, "<sequence><uuid value=\"0x1002\" /></sequence>");
        // English, UTF-8, strings at 0x0100.
        attr(
            &mut xml,
            0x0006,
            "<sequence><uint16 value=\"0x656e\" /><uint16 value=\"0x006a\" /><uint16 value=\"0x0100\" /></sequence>",
        );
        attr(
            &mut xml,
            0x0009,
            "<sequence><sequence><uuid value=\"0x1124\" /><uint16 value=\"0x0100\" /></sequence></sequence>",
        );
        // Additional protocol list: the interrupt PSM.
        attr(
            &mut xml,
            0x000d,
            &format!(
                "<sequence><sequence><sequence><uuid value=\"0x0100\" /><uint16 value=\"0x{:04x}\" /></sequence>\
                 <sequence><uuid value=\"0x0011\" /></sequence></sequence></sequence>",
                self.interrupt_psm
            ),
        );
        attr(&mut xml, 0x0100, &text(&self.name));
        attr(&mut xml, 0x0101, &text(&self.description));
        attr(&mut xml, 0x0102, &text(&self.provider));
        attr(&mut xml, 0x0200, "<uint16 value=\"0x0100\" />");
        // Parser version 1.11.
        attr(&mut xml, 0x0201, "<uint16 value=\"0x0111\" />");
        // Subclass: keyboard, not a boot device.
        attr(&mut xml, 0x0202, "<uint8 value=\"0x40\" />");
        attr(&mut xml, 0x0203, "<uint8 value=\"0x00\" />");
        attr(&mut xml, 0x0204, "<boolean value=\"false\" />");
        attr(&mut xml, 0x0205, "<boolean value=\"false\" />");
        attr(
            &mut xml,
            0x0206,
            &format!(
                "<sequence><sequence><uint8 value=\"0x22\" /><text encoding=\"hex\" value=\"{}\" /></sequence></sequence>",
                report_descriptor_hex()
            ),
        );
        attr(
            &mut xml,
            0x0207,
            "<sequence><sequence><uint16 value=\"0x0409\" /><uint16 value=\"0x0100\" /></sequence></sequence>",
        );
        attr(&mut xml, 0x020b, "<uint16 value=\"0x0100\" />");
        // Supervision timeout.
        attr(&mut xml, 0x020c, "<uint16 value=\"0x0c80\" />");
        // Normally connectable.
        attr(&mut xml, 0x020d, "<boolean value=\"true\" />");
        // Boot device.
        attr(&mut xml, 0x020e, "<boolean value=\"false\" />");
        attr(&mut xml, 0x020f, "<uint16 value=\"0x0640\" />");
        attr(&mut xml, 0x0210, "<uint16 value=\"0x0320\" />");

        xml.push_str("</record>\n");
        xml
    }
}

fn attr(xml: &mut String, id: u16, body: &str) {
    // Writing to a String cannot fail.
    let _ = writeln!(xml, "  <attribute id=\"0x{id:04x}\">{body}</attribute>");
}

fn text(value: &str) -> String {
    format!("<text value=\"{}\" />", escape(value))
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
