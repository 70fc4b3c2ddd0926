use std::io::Read;

use xmltree::{Element, XMLNode};

use super::DescriptionError;

/// Entrée `<service>` d'une `<serviceList>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceNode {
    pub service_id: String,
    pub service_type: String,
    pub control_url: String,
}

/// Device UPnP tel que décrit dans le document XML, avec ses sous-devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceNode {
    pub device_type: String,
    pub friendly_name: String,
    pub devices: Vec<DeviceNode>,
    pub services: Vec<ServiceNode>,
}

impl DeviceNode {
    /// Analyse un document de description et retourne son `<device>` racine.
    pub fn parse_root<R: Read>(reader: R) -> Result<Self, DescriptionError> {
        let root = Element::parse(reader)?;
        let device = root
            .get_child("device")
            .ok_or(DescriptionError::MissingField("device"))?;
        Ok(Self::from_element(device))
    }

    fn from_element(element: &Element) -> Self {
        let devices = element
            .get_child("deviceList")
            .map(|list| {
                xml_children(list)
                    .filter(|child| child.name == "device")
                    .map(Self::from_element)
                    .collect()
            })
            .unwrap_or_default();

        let services = element
            .get_child("serviceList")
            .map(|list| {
                xml_children(list)
                    .filter(|child| child.name == "service")
                    .map(ServiceNode::from_element)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            device_type: child_text(element, "deviceType").unwrap_or_default(),
            friendly_name: child_text(element, "friendlyName").unwrap_or_default(),
            devices,
            services,
        }
    }

    /// Sous-devices directs de type `device_type`
    pub fn child_devices<'a>(
        &'a self,
        device_type: &'a str,
    ) -> impl Iterator<Item = &'a DeviceNode> + 'a {
        self.devices
            .iter()
            .filter(move |device| device.device_type == device_type)
    }

    /// Services directs de type `service_type`
    pub fn services_of_type<'a>(
        &'a self,
        service_type: &'a str,
    ) -> impl Iterator<Item = &'a ServiceNode> + 'a {
        self.services
            .iter()
            .filter(move |service| service.service_type == service_type)
    }
}

impl ServiceNode {
    fn from_element(element: &Element) -> Self {
        Self {
            service_id: child_text(element, "serviceId").unwrap_or_default(),
            service_type: child_text(element, "serviceType").unwrap_or_default(),
            control_url: child_text(element, "controlURL").unwrap_or_default(),
        }
    }
}

fn xml_children(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(|node| match node {
        XMLNode::Element(elem) => Some(elem),
        _ => None,
    })
}

fn child_text(element: &Element, name: &str) -> Option<String> {
    xml_children(element)
        .find(|child| child.name == name)
        .and_then(|child| child.get_text().map(|cow| cow.trim().to_string()))
}
