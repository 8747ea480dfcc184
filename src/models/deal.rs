use serde::{Deserialize, Serialize};

use crate::hubspot::CrmObject;

/// Object type used when listing deals.
pub const DEAL_OBJECT_TYPE: &str = "deals";
/// Object type used as the target of deal associations.
pub const DEAL_ASSOCIATION_TYPE: &str = "deal";

pub const PROP_PIPELINE: &str = "pipeline";
pub const PROP_AMOUNT: &str = "amount";
pub const PROP_CLOSEDATE: &str = "closedate";

/// Deal properties the forecast reads.
pub const DEAL_PROPERTIES: [&str; 3] = [PROP_PIPELINE, PROP_AMOUNT, PROP_CLOSEDATE];

/// A CRM deal. Values are kept as the raw strings the CRM returned; the
/// calculator decides how to parse them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub pipeline: Option<String>,
    pub amount: Option<String>,
    pub close_date: Option<String>,
}

impl Deal {
    pub fn in_pipeline(&self, pipeline_id: &str) -> bool {
        self.pipeline.as_deref() == Some(pipeline_id)
    }
}

impl From<CrmObject> for Deal {
    fn from(obj: CrmObject) -> Self {
        let pipeline = obj.property(PROP_PIPELINE).map(str::to_string);
        let amount = obj.property(PROP_AMOUNT).map(str::to_string);
        let close_date = obj.property(PROP_CLOSEDATE).map(str::to_string);
        Self {
            id: obj.id,
            pipeline,
            amount,
            close_date,
        }
    }
}
